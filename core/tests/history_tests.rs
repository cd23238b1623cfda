// SPDX-License-Identifier: MIT OR Apache-2.0

//! Undo and redo through the game model

mod common;

use common::*;
use kifu_core::edit::SessionId;
use kifu_core::ruleset::ChineseRules;
use kifu_core::{
    Annotation, Color, ConfigError, GameError, GameModel, HistoryError, ModelConfig, TreeError,
};
use std::sync::Arc;

#[test]
fn nothing_to_undo_on_a_fresh_game() {
    let mut game = chinese(9, 9);
    assert!(!game.can_undo());
    assert!(!game.can_redo());
    assert!(matches!(
        game.undo(),
        Err(GameError::History(HistoryError::NothingToUndo))
    ));
    assert!(matches!(
        game.redo(),
        Err(GameError::History(HistoryError::NothingToRedo))
    ));
}

#[test]
fn undo_takes_back_a_move_and_redo_replays_it() {
    let mut game = chinese(9, 9);
    let root = game.root();
    let node = game.play(Color::Black, at(3, 3)).unwrap();

    game.undo().unwrap();
    assert_eq!(game.current(), root);
    assert!(game.tree().children(root).is_empty());
    assert!(game.node(node).is_none());
    assert!(game.can_redo());

    game.redo().unwrap();
    // Redo brings back the very same node
    assert_eq!(game.current(), node);
    assert_eq!(game.tree().children(root), &[node]);
    let snapshot = game.resolve_current().unwrap();
    assert_eq!(snapshot.board.get(at(3, 3)), Some(Color::Black));
}

#[test]
fn undo_of_an_import_leaves_the_cursor() {
    let mut game = chinese(9, 9);
    let root = game.root();
    let first = game.append_move(root, Color::Black, at(2, 2)).unwrap();
    let second = game.append_move(first, Color::White, at(6, 6)).unwrap();
    assert_eq!(game.current(), root);
    assert_eq!(game.tree().get(second).unwrap().depth(), 2);

    game.undo().unwrap();
    assert_eq!(game.current(), root);
    assert!(game.tree().children(first).is_empty());
}

#[test]
fn removed_variation_returns_to_its_place() {
    let mut game = chinese(9, 9);
    let root = game.root();
    let main = game.append_move(root, Color::Black, at(2, 2)).unwrap();
    let side = game.append_move(root, Color::Black, at(4, 4)).unwrap();
    let last = game.append_move(root, Color::Black, at(6, 6)).unwrap();
    let deep = game.append_move(side, Color::White, at(5, 5)).unwrap();

    game.set_current(deep).unwrap();
    game.remove_node(side).unwrap();
    assert_eq!(game.tree().children(root), &[main, last]);
    // The cursor was inside the removed subtree
    assert_eq!(game.current(), root);
    assert!(game.node(deep).is_none());
    assert!(matches!(
        game.set_current(deep),
        Err(TreeError::NotInTree)
    ));

    game.undo().unwrap();
    assert_eq!(game.tree().children(root), &[main, side, last]);
    assert_eq!(game.tree().children(side), &[deep]);
    game.validate(deep).unwrap();
}

#[test]
fn root_cannot_be_removed() {
    let mut game = chinese(9, 9);
    let root = game.root();
    assert!(matches!(
        game.remove_node(root),
        Err(GameError::Tree(TreeError::RootRemoval))
    ));
    assert!(!game.can_undo());
}

#[test]
fn new_edit_after_undo_drops_the_redo_branch() {
    let mut game = chinese(9, 9);
    game.play(Color::Black, at(3, 3)).unwrap();
    game.play(Color::White, at(5, 5)).unwrap();

    game.undo().unwrap();
    assert!(game.can_redo());
    game.play(Color::White, at(6, 6)).unwrap();
    assert!(!game.can_redo());
    assert_eq!(game.history().len(), 2);
}

#[test]
fn oldest_edits_fall_off_the_bounded_history() {
    let config = ModelConfig {
        max_history: 3,
        ..ModelConfig::default()
    };
    let mut game = GameModel::with_config(9, 9, Arc::new(ChineseRules), config).unwrap();
    for x in 0..5 {
        let color = if x % 2 == 0 { Color::Black } else { Color::White };
        game.play(color, at(x, 0)).unwrap();
    }
    assert_eq!(game.history().len(), 3);

    for _ in 0..3 {
        game.undo().unwrap();
    }
    assert!(!game.can_undo());
    // The two moves older than the bound stay played
    let snapshot = game.resolve_current().unwrap();
    assert_eq!(snapshot.move_number, 2);
}

#[test]
fn resizing_the_history_clears_it() {
    let mut game = chinese(9, 9);
    let node = game.play(Color::Black, at(3, 3)).unwrap();
    game.remove_node(node).unwrap();
    assert!(game.tree().get(node).is_some());

    game.set_max_history(10);
    assert!(!game.can_undo());
    assert!(!game.can_redo());
    assert_eq!(game.config().max_history, 10);
    // The detached node could only have come back through undo
    assert!(game.tree().get(node).is_none());
    assert_eq!(game.tree().len(), 1);
}

#[test]
fn annotation_session_is_one_undo_step() {
    let mut game = chinese(9, 9);
    let node = game.play(Color::Black, at(3, 3)).unwrap();
    let session = SessionId::new();

    for x in 0..4 {
        let added = game
            .add_annotation(node, Annotation::Circle(at(x, 8)), Some(session))
            .unwrap();
        assert!(added);
    }
    assert_eq!(game.annotations(node).unwrap().len(), 4);
    assert_eq!(game.history().len(), 2);

    game.undo().unwrap();
    assert!(game.annotations(node).unwrap().is_empty());
    // The move itself is still there
    assert_eq!(game.current(), node);

    game.redo().unwrap();
    assert_eq!(game.annotations(node).unwrap().len(), 4);
}

#[test]
fn annotations_without_session_undo_one_by_one() {
    let mut game = chinese(9, 9);
    let root = game.root();
    let mark = Annotation::Label(at(1, 1), "A".to_string());

    assert!(game.add_annotation(root, mark.clone(), None).unwrap());
    assert!(!game.add_annotation(root, mark.clone(), None).unwrap());
    assert!(game
        .add_annotation(root, Annotation::Triangle(at(2, 2)), None)
        .unwrap());
    assert_eq!(game.history().len(), 2);

    assert!(game.remove_annotation(root, &mark, None).unwrap());
    assert!(!game.remove_annotation(root, &mark, None).unwrap());
    assert_eq!(
        game.annotations(root).unwrap(),
        &[Annotation::Triangle(at(2, 2))]
    );

    game.undo().unwrap();
    assert_eq!(game.annotations(root).unwrap().len(), 2);
    game.undo().unwrap();
    assert_eq!(game.annotations(root).unwrap(), &[mark]);
}

#[test]
fn metadata_edits_are_undoable() {
    let mut game = chinese(9, 9);
    let root = game.root();

    game.set_metadata(root, "PB", "Shusaku", None).unwrap();
    game.set_metadata(root, "PB", "Shusaku", None).unwrap();
    assert_eq!(game.history().len(), 1);
    assert_eq!(game.metadata(root, "PB").unwrap(), Some("Shusaku"));

    game.remove_metadata(root, "PB", None).unwrap();
    assert_eq!(game.metadata(root, "PB").unwrap(), None);

    game.undo().unwrap();
    assert_eq!(game.metadata(root, "PB").unwrap(), Some("Shusaku"));
    game.undo().unwrap();
    assert_eq!(game.metadata(root, "PB").unwrap(), None);
}

#[test]
fn typing_a_comment_merges_into_one_edit() {
    let mut game = chinese(9, 9);
    let root = game.root();
    let session = SessionId::new();
    let mut text = String::new();
    for ch in "good".chars() {
        text.push(ch);
        game.set_metadata(root, "C", &text, Some(session)).unwrap();
    }
    assert_eq!(game.history().len(), 1);

    game.undo().unwrap();
    assert_eq!(game.metadata(root, "C").unwrap(), None);
}

#[test]
fn malformed_metadata_keys_are_rejected() {
    let mut game = chinese(9, 9);
    let root = game.root();

    for key in ["", "two words", "semi;colon", "dash-ed"] {
        assert!(matches!(
            game.set_metadata(root, key, "x", None),
            Err(GameError::Config(ConfigError::InvalidMetadataKey(_)))
        ));
        assert!(game.metadata(root, key).is_err());
    }
    assert!(!game.can_undo());
    game.set_metadata(root, "GN2", "x", None).unwrap();
}

#[test]
fn metadata_on_a_removed_node_is_an_error() {
    let mut game = chinese(9, 9);
    let node = game.play(Color::Black, at(3, 3)).unwrap();
    game.remove_node(node).unwrap();

    assert!(matches!(
        game.set_metadata(node, "C", "gone", None),
        Err(GameError::Tree(TreeError::NotInTree))
    ));
}

#[test]
fn abandoned_redo_moves_are_released() {
    let mut game = chinese(9, 9);
    let mut undone = Vec::new();
    for x in 0..5 {
        undone.push(game.play(Color::Black, at(x, 0)).unwrap());
        game.undo().unwrap();
    }
    // Each undo only detaches; the node waits for a redo
    assert!(game.tree().get(undone[4]).is_some());

    game.play(Color::Black, at(8, 8)).unwrap();
    for node in undone {
        assert!(game.tree().get(node).is_none());
    }
    assert_eq!(game.tree().len(), 2);
}

#[test]
fn evicted_removal_releases_the_branch() {
    let config = ModelConfig {
        max_history: 2,
        ..ModelConfig::default()
    };
    let mut game = GameModel::with_config(9, 9, Arc::new(ChineseRules), config).unwrap();
    let root = game.root();
    let branch = game.append_move(root, Color::Black, at(2, 2)).unwrap();
    let leaf = game.append_move(branch, Color::White, at(3, 3)).unwrap();
    game.remove_node(branch).unwrap();
    assert!(game.tree().get(leaf).is_some());

    // Two more edits push the removal out of the log
    game.set_metadata(root, "GN", "a", None).unwrap();
    game.set_metadata(root, "GN", "b", None).unwrap();
    assert!(game.tree().get(branch).is_none());
    assert!(game.tree().get(leaf).is_none());
}

#[test]
fn evicted_moves_stay_in_the_tree() {
    let config = ModelConfig {
        max_history: 1,
        ..ModelConfig::default()
    };
    let mut game = GameModel::with_config(9, 9, Arc::new(ChineseRules), config).unwrap();
    let first = game.play(Color::Black, at(2, 2)).unwrap();
    game.play(Color::White, at(3, 3)).unwrap();
    assert!(game.node(first).is_some());
    game.validate(first).unwrap();
}
