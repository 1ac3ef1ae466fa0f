//! Tests for the redraw orchestrator.

use super::*;
use crate::model::{ClientSideRowModel, RowId, RowNode, ServerSideRowModel};
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

// ===== Fixtures =====

#[derive(Debug, Default)]
struct Log {
    created: Vec<RowCtrlId>,
    destroyed: Vec<RowCtrlId>,
    restored: Vec<FocusedCell>,
}

/// Records component calls into a log shared with the test.
#[derive(Debug, Clone, Default)]
struct Recorder(Rc<RefCell<Log>>);

impl Recorder {
    fn created(&self) -> usize {
        self.0.borrow().created.len()
    }

    fn destroyed(&self) -> usize {
        self.0.borrow().destroyed.len()
    }

    fn restored(&self) -> Vec<FocusedCell> {
        self.0.borrow().restored.clone()
    }
}

impl RowComponentFactory for Recorder {
    fn create_row(&mut self, ctrl: &RowCtrl, _node: &crate::model::RowNode) {
        self.0.borrow_mut().created.push(ctrl.id());
    }

    fn destroy_row(&mut self, ctrl: &RowCtrl) {
        self.0.borrow_mut().destroyed.push(ctrl.id());
    }

    fn on_focus_restored(&mut self, cell: &FocusedCell) {
        self.0.borrow_mut().restored.push(cell.clone());
    }
}

fn options() -> GridOptions {
    GridOptions {
        row_height: 20,
        row_buffer: 10,
        ..GridOptions::default()
    }
}

fn ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("r{i}")).collect()
}

fn flat_model(count: usize) -> ClientSideRowModel {
    let ids = ids(count);
    ClientSideRowModel::from_ids(20, ids.iter().map(String::as_str))
}

/// Renderer over `count` 20px rows in a 400px viewport, already drawn once.
fn rendered(count: usize, options: GridOptions) -> (RowRenderer<ClientSideRowModel>, Recorder) {
    let recorder = Recorder::default();
    let mut renderer = RowRenderer::new(flat_model(count), options, recorder.clone()).with_viewport_height(400);
    renderer.redraw_after_model_update(ModelUpdate {
        new_data: true,
        ..ModelUpdate::default()
    });
    (renderer, recorder)
}

fn live_ids<M: RowModel>(renderer: &RowRenderer<M>) -> Vec<(usize, RowCtrlId)> {
    renderer
        .lifecycle()
        .live_ctrls()
        .map(|(index, ctrl)| (index, ctrl.id()))
        .collect()
}

fn displayed_changed(events: &[RenderEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RenderEvent::DisplayedRowsChanged { .. }))
        .count()
}

// ===== Model updates =====

mod model_update {
    use super::*;

    #[test]
    fn initial_render_builds_window_synchronously() {
        // GIVEN: 1000 rows of 20px, 400px viewport, buffer 10
        // WHEN: first model update
        let (mut renderer, recorder) = rendered(1000, options());

        // THEN: 0..=30 rendered and built inline
        assert_eq!(renderer.first_rendered_index(), 0);
        assert_eq!(renderer.last_rendered_index(), 30);
        assert_eq!(renderer.lifecycle().live_len(), 31);
        assert!(renderer.get_row_ctrls().iter().all(|c| c.is_built()));
        assert_eq!(recorder.created(), 31);
        assert_eq!(renderer.pending_frame_tasks(), 0);

        let events = renderer.take_events();
        assert!(events.contains(&RenderEvent::BodyHeightChanged { height: 20_000 }));
        assert!(events.contains(&RenderEvent::ViewportChanged { first: 0, last: 30 }));
        assert!(events.contains(&RenderEvent::RowCountChanged { count: 1000 }));
        assert!(events.contains(&RenderEvent::DisplayedRowsChanged { after_scroll: false }));
    }

    #[test]
    fn repeated_update_is_quiet_and_keeps_ctrls() {
        let (mut renderer, recorder) = rendered(1000, options());
        let before = live_ids(&renderer);
        renderer.take_events();

        renderer.redraw_after_model_update(ModelUpdate::recycle());

        assert_eq!(renderer.take_events(), Vec::new());
        assert_eq!(live_ids(&renderer), before);
        assert_eq!(recorder.created(), 31);
        assert_eq!(recorder.destroyed(), 0);
    }

    #[test]
    fn update_without_recycling_rebuilds_every_row() {
        let (mut renderer, recorder) = rendered(100, options());
        let before = live_ids(&renderer);

        renderer.redraw_after_model_update(ModelUpdate::default());

        let after = live_ids(&renderer);
        assert_eq!(after.len(), before.len());
        assert!(after.iter().zip(&before).all(|(a, b)| a.0 == b.0 && a.1 != b.1));
        assert_eq!(recorder.destroyed(), before.len());
        assert_eq!(displayed_changed(&renderer.take_events()), 2);
    }

    #[test]
    fn new_data_scrolls_to_top() {
        let (mut renderer, _) = rendered(1000, options());
        renderer.on_body_scroll(2000);
        renderer.take_events();

        renderer.redraw_after_model_update(ModelUpdate {
            new_data: true,
            recycle_rows: true,
            ..ModelUpdate::default()
        });

        assert_eq!(renderer.viewport_input().scroll_top, 0);
        assert_eq!(renderer.first_rendered_index(), 0);
        assert!(renderer.take_events().contains(&RenderEvent::ScrolledToTop));
    }

    #[test]
    fn scroll_on_new_data_can_be_suppressed() {
        let mut opts = options();
        opts.suppress_scroll_on_new_data = true;
        let (mut renderer, _) = rendered(1000, opts);
        renderer.on_body_scroll(2000);

        renderer.redraw_after_model_update(ModelUpdate {
            new_data: true,
            ..ModelUpdate::default()
        });

        assert_eq!(renderer.viewport_input().scroll_top, 2000);
        assert_eq!(renderer.first_rendered_index(), 90);
    }

    #[test]
    fn empty_model_keeps_one_pixel_body() {
        let (mut renderer, _) = rendered(0, options());

        assert!(renderer.take_events().contains(&RenderEvent::BodyHeightChanged { height: 1 }));
        assert_eq!(renderer.body_height(), 1);
        assert!(renderer.get_row_ctrls().is_empty());
        assert!(!renderer.is_range_in_rendered_viewport(0, 0));
    }
}

// ===== Recycling =====

mod recycling {
    use super::*;

    #[test]
    fn reorder_keeps_ctrl_identity_and_moves_geometry() {
        let recorder = Recorder::default();
        let model = ClientSideRowModel::from_ids(20, ["a", "b", "c"]);
        let mut renderer = RowRenderer::new(model, options(), recorder.clone()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let c_before = renderer.row_ctrl(2).unwrap().id();

        renderer
            .model_mut()
            .sort_children_by(None, |n| std::cmp::Reverse(n.id.clone()))
            .unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        let c_after = renderer.row_ctrl(0).unwrap();
        assert_eq!(c_after.id(), c_before);
        assert_eq!(c_after.row_index(), Some(0));
        assert_eq!(c_after.top(), 0);
        assert_eq!(recorder.created(), 3);
        assert_eq!(recorder.destroyed(), 0);
    }

    #[test]
    fn row_ctrls_follow_display_order_after_reorder() {
        let model = ClientSideRowModel::from_ids(20, ["a", "b", "c"]);
        let opts = GridOptions {
            ensure_dom_order: false,
            ..options()
        };
        let mut renderer = RowRenderer::new(model, opts, Recorder::default()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());

        renderer
            .model_mut()
            .sort_children_by(None, |n| std::cmp::Reverse(n.id.clone()))
            .unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        let order: Vec<_> = renderer
            .get_row_ctrls()
            .iter()
            .map(|c| (c.row_index(), c.row_id().map(|id| id.as_str())))
            .collect();
        assert_eq!(order, vec![(Some(0), Some("c")), (Some(1), Some("b")), (Some(2), Some("a"))]);
    }

    #[test]
    fn stub_rows_never_recycle() {
        let recorder = Recorder::default();
        let mut model = ClientSideRowModel::new(20);
        model.add_row(None, Some("a")).unwrap();
        model.add_row(None, None).unwrap();
        let mut renderer = RowRenderer::new(model, options(), recorder.clone()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let (a, stub) = (renderer.row_ctrl(0).unwrap().id(), renderer.row_ctrl(1).unwrap().id());

        renderer.redraw_after_model_update(ModelUpdate::recycle());

        assert_eq!(renderer.row_ctrl(0).unwrap().id(), a);
        assert_ne!(renderer.row_ctrl(1).unwrap().id(), stub);
        assert_eq!(recorder.0.borrow().destroyed, vec![stub]);
    }

    #[test]
    fn full_reload_with_same_ids_builds_new_ctrls() {
        let (mut renderer, recorder) = rendered(5, options());
        let before = live_ids(&renderer);

        let ids = ids(5);
        renderer.model_mut().set_row_data(ids.iter().map(String::as_str));
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        let after = live_ids(&renderer);
        assert!(after.iter().zip(&before).all(|(a, b)| a.1 != b.1));
        assert_eq!(recorder.destroyed(), 5);
    }

    #[test]
    fn animated_removal_leaves_zombie_until_drained() {
        let mut opts = options();
        opts.animate_rows = true;
        let recorder = Recorder::default();
        let mut model = ClientSideRowModel::new(20);
        model.add_row(None, Some("a")).unwrap();
        let b = model.add_row(None, Some("b")).unwrap();
        model.add_row(None, Some("c")).unwrap();
        let mut renderer = RowRenderer::new(model, opts, recorder.clone()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());

        renderer.model_mut().remove_node(b).unwrap();
        renderer.take_events();
        renderer.redraw_after_model_update(ModelUpdate {
            recycle_rows: true,
            animate: true,
            ..ModelUpdate::default()
        });

        // Zombie still listed while its exit animation runs
        let all = renderer.get_row_ctrls();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|c| c.is_zombie() && c.row_id() == Some(&RowId::new("b"))));
        assert_eq!(renderer.pending_deferred_batches(), 1);
        assert_eq!(recorder.destroyed(), 0);
        renderer.take_events();

        assert_eq!(renderer.run_deferred(), 1);
        assert_eq!(renderer.get_row_ctrls().len(), 2);
        assert_eq!(recorder.destroyed(), 1);
        assert_eq!(
            renderer.take_events(),
            vec![RenderEvent::DisplayedRowsChanged { after_scroll: false }]
        );
    }

    #[test]
    fn animation_needs_animate_rows_option() {
        let recorder = Recorder::default();
        let mut model = ClientSideRowModel::new(20);
        let a = model.add_row(None, Some("a")).unwrap();
        let mut renderer = RowRenderer::new(model, options(), recorder.clone()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());

        renderer.model_mut().remove_node(a).unwrap();
        renderer.redraw_after_model_update(ModelUpdate {
            recycle_rows: true,
            animate: true,
            ..ModelUpdate::default()
        });

        assert_eq!(renderer.pending_deferred_batches(), 0);
        assert_eq!(recorder.destroyed(), 1);
    }

    #[test]
    fn detail_row_round_trips_through_cache() {
        let mut opts = options();
        opts.keep_detail_rows = true;
        let mut model = ClientSideRowModel::new(20);
        let master = model.add_master(None, "m", true, 100).unwrap();
        let mut renderer = RowRenderer::new(model, opts, Recorder::default()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let detail = renderer.row_ctrl(1).unwrap().id();

        renderer.model_mut().set_expanded(master, false).unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());
        let cached: Vec<&RowCtrl> = renderer.get_row_ctrls().into_iter().filter(|c| c.is_cached()).collect();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id(), detail);

        renderer.model_mut().set_expanded(master, true).unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());
        assert_eq!(renderer.row_ctrl(1).unwrap().id(), detail);
    }
}

// ===== Scrolling =====

mod scroll {
    use super::*;

    #[test]
    fn one_row_scroll_shifts_both_bounds_without_rebuilds() {
        let (mut renderer, _) = rendered(1000, options());
        renderer.on_body_scroll(2000);
        renderer.flush_animation_frames();
        assert_eq!((renderer.first_rendered_index(), renderer.last_rendered_index()), (90, 130));
        let before = live_ids(&renderer);
        renderer.take_events();

        renderer.on_body_scroll(2020);

        assert_eq!((renderer.first_rendered_index(), renderer.last_rendered_index()), (91, 131));
        let after = live_ids(&renderer);
        let kept: Vec<_> = before.iter().filter(|b| after.contains(b)).collect();
        assert_eq!(kept.len(), 40);
        assert_eq!(renderer.pending_frame_tasks(), 1);
        assert!(!renderer.row_ctrl(131).unwrap().is_built());

        assert_eq!(
            renderer.take_events(),
            vec![
                RenderEvent::ViewportChanged { first: 91, last: 131 },
                RenderEvent::DisplayedRowsChanged { after_scroll: true },
            ]
        );
        assert_eq!(renderer.flush_animation_frames(), 1);
        assert!(renderer.row_ctrl(131).unwrap().is_built());
    }

    #[test]
    fn scroll_at_i64_max_renders_last_row() {
        let (mut renderer, _) = rendered(1000, options());

        renderer.on_body_scroll(i64::MAX);

        assert_eq!(renderer.last_rendered_index(), 999);
        assert!(renderer.row_ctrl(999).is_some());
    }

    #[test]
    fn repeated_scroll_to_same_position_is_quiet() {
        let (mut renderer, recorder) = rendered(1000, options());
        renderer.on_body_scroll(2000);
        renderer.flush_animation_frames();
        let created = recorder.created();
        renderer.take_events();

        renderer.on_body_scroll(2000);

        assert_eq!(renderer.take_events(), Vec::new());
        assert_eq!(recorder.created(), created);
        assert_eq!(renderer.pending_frame_tasks(), 0);
    }

    #[test]
    fn suppressed_animation_frame_builds_inline() {
        let mut opts = options();
        opts.suppress_animation_frame = true;
        let (mut renderer, _) = rendered(1000, opts);

        renderer.on_body_scroll(2000);

        assert_eq!(renderer.pending_frame_tasks(), 0);
        assert!(renderer.get_row_ctrls().iter().all(|c| c.is_built()));
    }

    #[test]
    fn superseded_frame_tasks_are_noops() {
        let (mut renderer, recorder) = rendered(1000, options());
        renderer.on_body_scroll(2000);
        renderer.on_body_scroll(10_000);

        assert_eq!(renderer.pending_frame_tasks(), 82);
        renderer.flush_animation_frames();

        // Only the rows still live were built
        assert_eq!(recorder.created(), 31 + 41);
        assert!(renderer.get_row_ctrls().iter().all(|c| c.is_built()));
    }

    #[test]
    fn rendered_range_queries() {
        let (mut renderer, _) = rendered(1000, options());
        renderer.on_body_scroll(2000);

        assert!(renderer.is_range_in_rendered_viewport(80, 90));
        assert!(renderer.is_range_in_rendered_viewport(130, 200));
        assert!(!renderer.is_range_in_rendered_viewport(0, 89));
        assert!(!renderer.is_range_in_rendered_viewport(131, 140));
    }
}

// ===== Retention =====

mod retention {
    use super::*;

    #[test]
    fn editing_row_survives_scroll_until_edit_stops() {
        let (mut renderer, _) = rendered(1000, options());
        let editing = renderer.row_ctrl(5).unwrap().id();
        assert!(renderer.start_editing(5));

        renderer.on_body_scroll(2000);
        assert_eq!(renderer.row_ctrl(5).map(RowCtrl::id), Some(editing));
        assert!(renderer.get_row_ctrls().iter().any(|c| c.id() == editing));

        renderer.stop_editing(5);
        renderer.on_body_scroll(2020);
        assert!(renderer.row_ctrl(5).is_none());
    }

    #[test]
    fn focused_row_survives_scroll() {
        let (mut renderer, _) = rendered(1000, options());
        renderer.set_focused_cell(Some(FocusedCell::new(5, None, "name")));

        renderer.on_body_scroll(2000);

        assert!(renderer.row_ctrl(5).is_some());
    }

    #[test]
    fn editing_row_removed_from_model_is_dropped() {
        let (mut renderer, _) = rendered(1000, options());
        renderer.start_editing(5);
        renderer.on_body_scroll(2000);

        let r5 = renderer.model().rows_to_display()[5];
        renderer.model_mut().remove_node(r5).unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        assert!(renderer
            .get_row_ctrls()
            .iter()
            .all(|c| c.row_id() != Some(&RowId::new("r5"))));
        assert!(renderer.row_ctrl(5).is_none());
    }

    #[test]
    fn open_detail_row_is_retained() {
        let mut model = ClientSideRowModel::new(20);
        model.add_master(None, "m", true, 20).unwrap();
        let ids = ids(100);
        for id in &ids {
            model.add_row(None, Some(id)).unwrap();
        }
        let mut renderer = RowRenderer::new(model, options(), Recorder::default()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let detail = renderer.row_ctrl(1).unwrap().id();

        renderer.on_body_scroll(1000);

        assert_eq!(renderer.row_ctrl(1).map(RowCtrl::id), Some(detail));
        assert!(renderer.row_ctrl(0).is_none());
    }

    /// Master `m` with a detail row, then 100 plain rows, scrolled so the
    /// detail row is only alive through retention.
    fn scrolled_past_detail(opts: GridOptions) -> (RowRenderer<ClientSideRowModel>, Recorder, NodeId, RowCtrlId) {
        let mut model = ClientSideRowModel::new(20);
        let master = model.add_master(None, "m", true, 20).unwrap();
        let ids = ids(100);
        for id in &ids {
            model.add_row(None, Some(id)).unwrap();
        }
        let recorder = Recorder::default();
        let mut renderer = RowRenderer::new(model, opts, recorder.clone()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let detail = renderer.row_ctrl(1).unwrap().id();
        renderer.on_body_scroll(1000);
        assert_eq!(renderer.row_ctrl(1).map(RowCtrl::id), Some(detail));
        (renderer, recorder, master, detail)
    }

    #[test]
    fn collapsing_master_releases_retained_detail_to_cache() {
        // GIVEN: detail row retained outside the window, side cache on
        let mut opts = options();
        opts.keep_detail_rows = true;
        let (mut renderer, recorder, master, detail) = scrolled_past_detail(opts);

        // WHEN: the master collapses and the model is redrawn
        renderer.model_mut().set_expanded(master, false).unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        // THEN: the detail ctrl left the live map and was parked in the cache
        assert!(renderer.lifecycle().find_live(detail).is_none());
        let cached: Vec<RowCtrlId> = renderer
            .get_row_ctrls()
            .into_iter()
            .filter(|c| c.is_cached())
            .map(RowCtrl::id)
            .collect();
        assert_eq!(cached, vec![detail]);
        assert!(!recorder.0.borrow().destroyed.contains(&detail));
    }

    #[test]
    fn collapsing_master_destroys_retained_detail_without_cache() {
        let (mut renderer, recorder, master, detail) = scrolled_past_detail(options());

        renderer.model_mut().set_expanded(master, false).unwrap();
        renderer.redraw_after_model_update(ModelUpdate::recycle());

        assert!(renderer.lifecycle().find_live(detail).is_none());
        assert!(renderer.get_row_ctrls().iter().all(|c| c.id() != detail));
        assert!(recorder.0.borrow().destroyed.contains(&detail));
    }
}

// ===== Focus =====

mod focus {
    use super::*;

    #[test]
    fn focus_moves_to_rebuilt_row_after_update() {
        let (mut renderer, recorder) = rendered(100, options());
        let cell = FocusedCell::new(2, None, "name");
        renderer.set_focused_cell(Some(cell.clone()));
        let old = renderer.row_ctrl(2).unwrap().id();
        assert_eq!(renderer.focus_target(), FocusTarget::Cell(old));
        renderer.take_events();

        renderer.redraw_after_model_update(ModelUpdate::default());

        let new = renderer.row_ctrl(2).unwrap().id();
        assert_ne!(new, old);
        assert_eq!(renderer.focus_target(), FocusTarget::Cell(new));
        assert_eq!(recorder.restored(), vec![cell.clone()]);
        assert!(renderer.take_events().contains(&RenderEvent::FocusRestored { cell }));
    }

    #[test]
    fn editor_focus_is_left_alone() {
        let (mut renderer, recorder) = rendered(100, options());
        renderer.set_focused_cell(Some(FocusedCell::new(2, None, "name")));
        renderer.set_focus_target(FocusTarget::Editor);

        renderer.redraw_after_model_update(ModelUpdate::default());

        assert_eq!(renderer.focus_target(), FocusTarget::Editor);
        assert!(recorder.restored().is_empty());
    }

    #[test]
    fn suppress_keep_focus_skips_restore() {
        let (mut renderer, recorder) = rendered(100, options());
        renderer.set_focused_cell(Some(FocusedCell::new(2, None, "name")));

        renderer.redraw_after_model_update(ModelUpdate {
            suppress_keep_focus: true,
            ..ModelUpdate::default()
        });

        assert_eq!(renderer.focus_target(), FocusTarget::Outside);
        assert!(recorder.restored().is_empty());
    }
}

// ===== Sticky rows =====

mod sticky {
    use super::*;

    /// g0 > g1 > g2 > leaf0..leaf9, then tail0..tail4; 10px rows.
    fn nested_groups() -> ClientSideRowModel {
        let mut model = ClientSideRowModel::new(10);
        let g0 = model.add_group(None, "g0", true).unwrap();
        let g1 = model.add_group(Some(g0), "g1", true).unwrap();
        let g2 = model.add_group(Some(g1), "g2", true).unwrap();
        for i in 0..10 {
            model.add_row(Some(g2), Some(&format!("leaf{i}"))).unwrap();
        }
        for i in 0..5 {
            model.add_row(None, Some(&format!("tail{i}"))).unwrap();
        }
        model
    }

    fn sticky_renderer() -> RowRenderer<ClientSideRowModel> {
        let opts = GridOptions {
            row_height: 10,
            row_buffer: 0,
            group_rows_sticky: true,
            suppress_animation_frame: true,
            ..GridOptions::default()
        };
        let mut renderer = RowRenderer::new(nested_groups(), opts, Recorder::default()).with_viewport_height(50);
        renderer.redraw_after_model_update(ModelUpdate::default());
        renderer
    }

    #[test]
    fn scrolled_groups_render_in_sticky_band() {
        let mut renderer = sticky_renderer();
        renderer.take_events();

        renderer.on_body_scroll(55);

        let sticky: Vec<(Option<usize>, i64)> = renderer
            .sticky_ctrls()
            .iter()
            .map(|c| (c.row_index(), c.top()))
            .collect();
        assert_eq!(sticky, vec![(Some(2), 20), (Some(1), 10), (Some(0), 0)]);
        assert!(renderer.sticky_ctrls().iter().all(|c| c.container() == RowContainer::StickyTop));
        assert_eq!(renderer.sticky_height(), 30);
        assert!(renderer.take_events().contains(&RenderEvent::StickyHeightChanged { height: 30 }));
        assert!((0..=2).all(|i| renderer.row_ctrl(i).is_none()));
    }

    #[test]
    fn scrolling_back_to_top_unpins() {
        let mut renderer = sticky_renderer();
        renderer.on_body_scroll(55);

        renderer.on_body_scroll(0);

        assert!(renderer.sticky_ctrls().is_empty());
        assert_eq!(renderer.sticky_height(), 0);
        assert!((0..=2).all(|i| renderer.row_ctrl(i).is_some()));
    }

    #[test]
    fn focus_follows_row_into_sticky_band() {
        let mut renderer = sticky_renderer();
        let cell = FocusedCell::new(1, None, "group");
        renderer.set_focused_cell(Some(cell.clone()));
        renderer.take_events();

        renderer.on_body_scroll(55);

        let sticky_g1 = renderer
            .sticky_ctrls()
            .iter()
            .find(|c| c.row_index() == Some(1))
            .unwrap()
            .id();
        assert_eq!(renderer.focus_target(), FocusTarget::Cell(sticky_g1));
        assert!(renderer.take_events().contains(&RenderEvent::FocusRestored { cell }));
    }

    #[test]
    fn redraw_rows_rebuilds_sticky_ctrl() {
        let mut renderer = sticky_renderer();
        renderer.on_body_scroll(55);
        let g0 = renderer.model().rows_to_display()[0];
        let old = renderer.sticky_ctrls()[2].id();

        renderer.redraw_rows(Some(&[g0][..]));

        let new = renderer.sticky_ctrls()[2].id();
        assert_ne!(new, old);
        assert_eq!(renderer.sticky_ctrls()[2].top(), 0);
    }
}

// ===== Partial redraw, pinned rows, columns =====

mod partial {
    use super::*;

    #[test]
    fn redraw_rows_rebuilds_only_given_rows() {
        let (mut renderer, _) = rendered(100, options());
        let before = live_ids(&renderer);
        let target = renderer.model().rows_to_display()[3];

        renderer.redraw_rows(Some(&[target][..]));

        let after = live_ids(&renderer);
        for ((index, old), (_, new)) in before.iter().zip(&after) {
            if *index == 3 {
                assert_ne!(old, new);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn redraw_all_rows_rebuilds_everything() {
        let (mut renderer, recorder) = rendered(100, options());
        renderer.redraw_rows(None);
        assert_eq!(recorder.destroyed(), 31);
        assert_eq!(recorder.created(), 62);
    }

    #[test]
    fn pinned_rows_rebuild_unless_only_body() {
        let (mut renderer, _) = rendered(100, options());
        let top = renderer
            .model_mut()
            .nodes_mut()
            .insert(RowNode::new(Some(RowId::new("top")), 30));
        renderer.set_pinned_top_rows(vec![top]);

        let first = renderer.pinned_top_ctrls()[0].clone();
        assert_eq!(first.container(), RowContainer::PinnedTop);
        assert_eq!(first.row_index(), Some(0));
        assert_eq!(renderer.model().node(top).unwrap().pinned, Some(RowPinned::Top));

        renderer.redraw_after_model_update(ModelUpdate {
            recycle_rows: true,
            only_body: true,
            ..ModelUpdate::default()
        });
        assert_eq!(renderer.pinned_top_ctrls()[0].id(), first.id());

        renderer.redraw_after_model_update(ModelUpdate::recycle());
        assert_ne!(renderer.pinned_top_ctrls()[0].id(), first.id());
    }

    #[test]
    fn unpinned_row_loses_display_position() {
        // GIVEN: a row pinned to the top
        let (mut renderer, _) = rendered(100, options());
        let top = renderer
            .model_mut()
            .nodes_mut()
            .insert(RowNode::new(Some(RowId::new("top")), 30));
        renderer.set_pinned_top_rows(vec![top]);
        assert!(renderer.model().is_row_present(top));

        // WHEN: the pinned list is emptied
        renderer.set_pinned_top_rows(Vec::new());

        // THEN: the node is no longer pinned or displayed
        let node = renderer.model().node(top).unwrap();
        assert_eq!(node.pinned, None);
        assert_eq!(node.row_index, None);
        assert_eq!(node.row_top, None);
        assert!(!renderer.model().is_row_present(top));
        assert!(renderer.pinned_top_ctrls().is_empty());
    }

    #[test]
    fn destroy_releases_pinned_rows() {
        let (mut renderer, _) = rendered(100, options());
        let bottom = renderer
            .model_mut()
            .nodes_mut()
            .insert(RowNode::new(Some(RowId::new("bottom")), 30));
        renderer.set_pinned_bottom_rows(vec![bottom]);

        renderer.destroy();

        let node = renderer.model().node(bottom).unwrap();
        assert_eq!(node.pinned, None);
        assert!(!node.is_displayed());
    }

    #[test]
    fn pinning_toggle_rebuilds_full_width_rows() {
        let mut model = ClientSideRowModel::new(20);
        model.add_master(None, "m", true, 100).unwrap();
        let mut renderer = RowRenderer::new(model, options(), Recorder::default()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());
        let (master, detail) = (renderer.row_ctrl(0).unwrap().id(), renderer.row_ctrl(1).unwrap().id());

        renderer.on_displayed_columns_changed(true, false);

        assert_eq!(renderer.row_ctrl(0).unwrap().id(), master);
        assert_ne!(renderer.row_ctrl(1).unwrap().id(), detail);

        let rebuilt = renderer.row_ctrl(1).unwrap().id();
        renderer.on_displayed_columns_changed(true, false);
        assert_eq!(renderer.row_ctrl(1).unwrap().id(), rebuilt);
    }
}

// ===== Layout and pagination =====

mod layout {
    use super::*;

    #[test]
    fn switching_to_print_renders_page_without_recycling() {
        let (mut renderer, _) = rendered(50, options());
        let before = live_ids(&renderer);

        renderer.set_dom_layout(DomLayout::Print);

        assert_eq!((renderer.first_rendered_index(), renderer.last_rendered_index()), (0, 49));
        let after = live_ids(&renderer);
        assert_eq!(after.len(), 50);
        assert!(before.iter().all(|b| !after.contains(b)));
    }

    #[test]
    fn switch_between_non_print_layouts_does_not_redraw() {
        let (mut renderer, _) = rendered(50, options());
        renderer.take_events();

        renderer.set_dom_layout(DomLayout::AutoHeight);

        assert!(renderer.take_events().is_empty());
    }

    #[test]
    fn page_change_renders_new_page_with_offset() {
        let mut opts = options();
        opts.pagination_page_size = Some(10);
        let (mut renderer, _) = rendered(100, opts);
        assert_eq!(renderer.last_rendered_index(), 9);
        renderer.take_events();

        assert!(renderer.on_pagination_changed(2));
        assert!(!renderer.on_pagination_changed(2));

        assert_eq!((renderer.first_rendered_index(), renderer.last_rendered_index()), (20, 29));
        assert_eq!(renderer.row_ctrl(20).unwrap().top(), 0);
        assert!(renderer.row_ctrl(0).is_none());
        assert!(renderer.take_events().contains(&RenderEvent::ScrolledToTop));
    }
}

// ===== Height debounce and teardown =====

mod lifecycle_hooks {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn height_change_redraws_after_debounce() {
        let (mut renderer, _) = rendered(100, options());
        let start = Instant::now();
        let r0 = renderer.model().rows_to_display()[0];
        renderer.model_mut().set_row_height(r0, 40).unwrap();
        renderer.on_row_height_changed(start);
        renderer.take_events();

        assert!(!renderer.tick(start + Duration::from_millis(50)));
        assert!(renderer.tick(start + Duration::from_millis(100)));
        assert!(!renderer.tick(start + Duration::from_millis(200)));

        assert!(renderer
            .take_events()
            .contains(&RenderEvent::BodyHeightChanged { height: 2020 }));
        assert_eq!(renderer.row_ctrl(1).unwrap().top(), 40);
    }

    #[test]
    fn destroy_cancels_debounce_and_tears_down() {
        let (mut renderer, recorder) = rendered(100, options());
        let start = Instant::now();
        renderer.on_row_height_changed(start);

        renderer.destroy();

        assert!(!renderer.tick(start + Duration::from_millis(500)));
        assert!(renderer.is_destroyed());
        assert_eq!(recorder.destroyed(), recorder.created());
        assert!(renderer.get_row_ctrls().is_empty());
    }
}

// ===== Re-entrancy =====

mod reentrancy {
    use super::*;

    /// Cell renderer that asks for a redraw while being rendered.
    struct ReentrantRenderer {
        guard: RedrawGuard,
    }

    impl RowComponentFactory for ReentrantRenderer {
        fn create_row(&mut self, _ctrl: &RowCtrl, _node: &crate::model::RowNode) {
            let _nested = self.guard.enter();
        }
    }

    fn reentrant_renderer() -> (RowRenderer<ClientSideRowModel>, RedrawGuard) {
        let guard = RedrawGuard::new();
        let model = ClientSideRowModel::from_ids(20, ["a", "b", "c"]);
        let components = ReentrantRenderer { guard: guard.clone() };
        let renderer = RowRenderer::new(model, options(), components)
            .with_viewport_height(400)
            .with_redraw_guard(guard.clone());
        (renderer, guard)
    }

    #[test]
    #[should_panic(expected = "defer the call")]
    fn redraw_from_inside_render_panics() {
        let (mut renderer, _) = reentrant_renderer();
        renderer.redraw_after_model_update(ModelUpdate::default());
    }

    #[test]
    fn failed_redraw_leaves_live_map_untouched() {
        let (mut renderer, guard) = reentrant_renderer();

        let result = catch_unwind(AssertUnwindSafe(|| {
            renderer.redraw_after_model_update(ModelUpdate::default());
        }));

        assert!(result.is_err());
        assert_eq!(renderer.lifecycle().live_len(), 0);
        assert!(!guard.is_active());
    }
}

// ===== Server-side model =====

mod server_side {
    use super::*;

    #[test]
    fn collapsed_group_children_are_not_rendered() {
        let mut model = ServerSideRowModel::new(20);
        let root = model.root_store();
        for i in 0..5 {
            model.add_row(root, Some(&format!("r{i}"))).unwrap();
        }
        let (_, store) = model.add_group(root, "g", false).unwrap();
        let children: Vec<String> = (0..35).map(|i| format!("c{i}")).collect();
        model.load_rows(store, children.iter().map(|s| Some(s.as_str()))).unwrap();
        model.add_row(root, Some("s0")).unwrap();

        let mut renderer = RowRenderer::new(model, options(), Recorder::default()).with_viewport_height(400);
        renderer.redraw_after_model_update(ModelUpdate::default());

        let rendered: Vec<String> = renderer
            .get_row_ctrls()
            .iter()
            .filter_map(|c| c.row_id().map(|id| id.as_str().to_owned()))
            .collect();
        assert_eq!(rendered, vec!["r0", "r1", "r2", "r3", "r4", "g", "s0"]);
    }
}
