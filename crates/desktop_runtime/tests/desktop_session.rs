use std::cell::{Cell, RefCell};
use std::rc::Rc;

use desktop_runtime::{
    DesktopConfig, DesktopHost, DesktopRuntime, PointerInput, PointerPosition, Position,
    ResizeHandle, Size, Theme, WindowId, DEFAULT_STORAGE_KEY,
};
use futures::executor::block_on;
use platform_host::{MemoryStorage, StorageError};
use serde_json::json;

fn runtime_on(storage: &MemoryStorage, now: &Rc<Cell<u64>>) -> DesktopRuntime {
    let clock_now = Rc::clone(now);
    let host = DesktopHost::new(Rc::new(storage.clone()), Rc::new(move || clock_now.get()));
    DesktopRuntime::new(DesktopConfig::default(), host)
}

fn seed(storage: &MemoryStorage) {
    storage.insert_raw(
        DEFAULT_STORAGE_KEY,
        json!({
            "theme": "light",
            "windows": [
                {
                    "id": "notes",
                    "title": "Notes",
                    "componentKind": "notes",
                    "position": { "x": 100, "y": 100 },
                    "size": { "width": 400, "height": 300 },
                    "zIndex": 101,
                    "isMinimized": false,
                    "isFocused": false
                },
                {
                    "id": "terminal",
                    "title": "Terminal",
                    "componentKind": "terminal",
                    "position": { "x": 300, "y": 200 },
                    "size": { "width": 500, "height": 320 },
                    "zIndex": 105,
                    "isMinimized": false,
                    "isFocused": true
                }
            ],
            "iconPositions": [["about", { "x": 16, "y": 16 }]]
        })
        .to_string(),
    );
}

#[test]
fn full_session_survives_reload() {
    let storage = MemoryStorage::default();
    seed(&storage);
    let now = Rc::new(Cell::new(10_000));
    let mut runtime = runtime_on(&storage, &now);

    let snapshots = Rc::new(RefCell::new(0usize));
    let seen = Rc::clone(&snapshots);
    runtime.subscribe(move |_| *seen.borrow_mut() += 1);

    block_on(runtime.boot());
    assert_eq!(runtime.state().theme, Theme::Light);
    assert_eq!(
        runtime.focused_window().map(|w| w.id.as_str()),
        Some("terminal")
    );
    assert_eq!(runtime.state().next_z_index, 106);

    let notes = WindowId::new("notes");
    runtime.handle_pointer(PointerInput::Down {
        window_id: notes.clone(),
        handle: None,
        pointer: PointerPosition::new(150, 120),
    });
    assert_eq!(runtime.focused_window().map(|w| w.id.clone()), Some(notes.clone()));
    assert_eq!(runtime.window(&notes).map(|w| w.z_index), Some(106));

    now.set(10_100);
    runtime.handle_pointer(PointerInput::Move {
        pointer: PointerPosition::new(250, 220),
    });
    runtime.handle_pointer(PointerInput::Up {
        pointer: PointerPosition::new(250, 220),
    });
    assert_eq!(
        runtime.window(&notes).map(|w| w.position),
        Some(Position::new(200, 200))
    );

    now.set(10_300);
    runtime.handle_pointer(PointerInput::Down {
        window_id: notes.clone(),
        handle: Some(ResizeHandle::E),
        pointer: PointerPosition::new(600, 300),
    });
    runtime.handle_pointer(PointerInput::Move {
        pointer: PointerPosition::new(650, 300),
    });
    runtime.handle_pointer(PointerInput::Up {
        pointer: PointerPosition::new(650, 300),
    });
    assert_eq!(
        runtime.window(&notes).map(|w| w.size),
        Some(Size::new(450, 300))
    );
    assert!(runtime.interaction().is_idle());
    assert!(*snapshots.borrow() >= 4);

    now.set(11_000);
    runtime.tick();
    assert_eq!(storage.write_count(), 0);

    now.set(11_300);
    runtime.tick();
    assert_eq!(storage.write_count(), 1);

    let mut reloaded = runtime_on(&storage, &now);
    block_on(reloaded.boot());
    assert_eq!(reloaded.state().theme, runtime.state().theme);
    assert_eq!(reloaded.state().windows, runtime.state().windows);
    assert_eq!(reloaded.state().icon_positions, runtime.state().icon_positions);
    assert_eq!(
        reloaded.focused_window().map(|w| w.id.clone()),
        Some(notes)
    );
}

#[test]
fn corrupt_record_boots_with_defaults_and_is_removed() {
    let storage = MemoryStorage::default();
    storage.insert_raw(DEFAULT_STORAGE_KEY, "\"just a string\"");
    let now = Rc::new(Cell::new(0));
    let mut runtime = runtime_on(&storage, &now);

    block_on(runtime.boot());

    assert_eq!(runtime.state().theme, Theme::Dark);
    assert!(runtime.state().windows.is_empty());
    assert_eq!(storage.raw(DEFAULT_STORAGE_KEY), None);
}

#[test]
fn partially_invalid_record_keeps_valid_fields_across_two_reloads() {
    let storage = MemoryStorage::default();
    storage.insert_raw(
        DEFAULT_STORAGE_KEY,
        json!({
            "theme": "solarized",
            "windows": [{
                "id": "notes",
                "title": "Notes",
                "componentKind": "notes",
                "position": { "x": 100, "y": 100 },
                "size": { "width": 400, "height": 300 },
                "zIndex": 101,
                "isMinimized": false,
                "isFocused": true
            }],
            "iconPositions": [["about", { "x": 16, "y": 16 }]]
        })
        .to_string(),
    );
    let now = Rc::new(Cell::new(0));

    let mut first = runtime_on(&storage, &now);
    block_on(first.boot());
    assert_eq!(first.state().theme, Theme::Dark);
    assert_eq!(first.state().windows.len(), 1);
    assert_eq!(first.state().icon_positions.len(), 1);

    let mut second = runtime_on(&storage, &now);
    block_on(second.boot());
    assert_eq!(second.state().theme, Theme::Dark);
    assert_eq!(second.state().windows, first.state().windows);
    assert_eq!(second.state().icon_positions, first.state().icon_positions);
    assert_eq!(storage.write_count(), 1);
}

#[test]
fn unreadable_storage_boots_with_defaults() {
    let storage = MemoryStorage::default();
    seed(&storage);
    storage.fail_reads_with(Some(StorageError::Unavailable));
    let now = Rc::new(Cell::new(0));
    let mut runtime = runtime_on(&storage, &now);

    block_on(runtime.boot());

    assert_eq!(runtime.state().theme, Theme::Dark);
    assert!(runtime.state().windows.is_empty());
    assert!(storage.raw(DEFAULT_STORAGE_KEY).is_some());
}

#[test]
fn ghost_window_commands_leave_session_untouched() {
    let storage = MemoryStorage::default();
    let now = Rc::new(Cell::new(0));
    let mut runtime = runtime_on(&storage, &now);
    let before = runtime.state().clone();

    let ghost = WindowId::new("ghost");
    runtime.close_window(&ghost);
    runtime.maximize_window(&ghost);
    runtime.handle_pointer(PointerInput::Down {
        window_id: ghost,
        handle: None,
        pointer: PointerPosition::new(0, 0),
    });

    assert_eq!(runtime.state(), &before);
    assert!(runtime.interaction().is_idle());
    now.set(60_000);
    runtime.tick();
    assert_eq!(storage.write_count(), 0);
}
