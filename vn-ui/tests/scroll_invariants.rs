//! 滚动与环形缓冲的性质测试

use proptest::prelude::*;
use vn_ui::{
    Backlog, BacklogView, EngineState, InputSnapshot, ListView, PointerPos, RecordingBackend,
    Screen, UiConfig,
};

fn filled_state(capacity: usize, commits: usize, backend: &mut RecordingBackend) -> EngineState {
    let mut config = UiConfig::default();
    config.backlog.capacity = capacity;
    let mut state = EngineState::new(config);
    for i in 0..commits {
        let line = backend.create_text(format!("第 {} 句", i));
        state.backlog.commit(vec![Some(line)], backend);
    }
    state
}

fn run_frame(
    view: &mut ListView<BacklogView>,
    state: &mut EngineState,
    backend: &mut RecordingBackend,
    snapshot: InputSnapshot,
) {
    state.input.advance(snapshot);
    let result = Screen::<RecordingBackend>::update(view, state, backend, 0.016);
    assert!(result.is_ok());
}

fn arb_snapshot() -> impl Strategy<Value = InputSnapshot> {
    (
        proptest::option::of(0.0f32..480.0),
        any::<bool>(),
        -3i8..=3,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(y, pointer_down, wheel, up, down)| InputSnapshot {
            up,
            down,
            pointer: y.map(|y| PointerPos::new(100.0, y)),
            pointer_down,
            wheel_delta: wheel as f32,
            ..Default::default()
        })
}

proptest! {
    /// 任意输入序列后滚动量都在一个节点高度以内，锚点始终是有效记录
    #[test]
    fn offset_stays_within_one_node(
        capacity in 1usize..8,
        commits in 1usize..12,
        frames in prop::collection::vec(arb_snapshot(), 1..40),
    ) {
        let mut backend = RecordingBackend::new();
        let mut state = filled_state(capacity, commits, &mut backend);
        let mut view = BacklogView::open(&state.config, &state.backlog);
        let h = view.node_height();

        for snapshot in frames {
            run_frame(&mut view, &mut state, &mut backend, snapshot);

            let offset = view.scroll_offset();
            prop_assert!(offset > -h && offset < h, "offset {} 超出 ±{}", offset, h);

            let anchor = view.anchor().index();
            prop_assert!(anchor.is_some());
            let record = anchor.and_then(|i| state.backlog.record(i));
            prop_assert!(record.is_some_and(|r| r.is_committed()));
        }
    }

    /// 没有连续输入时，每次按键选中位置恰好移动一格
    #[test]
    fn discrete_press_moves_selection_by_one(
        presses in prop::collection::vec(any::<bool>(), 1..20),
    ) {
        let mut backend = RecordingBackend::new();
        let mut state = filled_state(4, 4, &mut backend);
        let mut view = BacklogView::open(&state.config, &state.backlog);

        for up in presses {
            let before = view.selection_offset();
            run_frame(&mut view, &mut state, &mut backend, InputSnapshot {
                up,
                down: !up,
                ..Default::default()
            });
            // 倒序布局："上"朝序列后方
            let expected = if up { before + 1 } else { before - 1 };
            prop_assert_eq!(view.selection_offset(), expected);
            prop_assert_eq!(view.scroll_offset(), 0.0);

            run_frame(&mut view, &mut state, &mut backend, InputSnapshot::default());
        }
    }

    /// 写入 n 条后恰好能遍历到 min(n, C) 条，且无句柄泄漏
    #[test]
    fn ring_keeps_capacity_records(capacity in 1usize..16, commits in 0usize..40) {
        let mut backend = RecordingBackend::new();
        let mut backlog = Backlog::new(capacity);
        for i in 0..commits {
            let line = backend.create_text(format!("{}", i));
            backlog.commit(vec![Some(line)], &mut backend);
        }

        let expected = commits.min(capacity);
        prop_assert_eq!(backlog.iter_recent().count(), expected);
        prop_assert_eq!(backend.live_texts(), expected);

        backlog.release_all(&mut backend);
        prop_assert_eq!(backend.live_texts(), 0);
    }
}
