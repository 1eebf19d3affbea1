use led_canvas::grid::{MemoryStore, PixelColor};
use led_canvas::shortcut::{Key, KeyEvent};

#[path = "mock_device.rs"]
mod mock_device;

use mock_device::harness;

#[test]
fn ctrl_z_and_cmd_z_undo_the_last_edit() {
    let mut h = harness(2, 1, MemoryStore::new());
    h.controller.update_pixel(0, PixelColor::rgb(1, 1, 1));
    h.controller.update_pixel(1, PixelColor::rgb(2, 2, 2));

    let ctrl_z = KeyEvent {
        ctrl: true,
        ..KeyEvent::plain(Key::Char('z'))
    };
    assert!(h.controller.handle_key(&ctrl_z));
    assert_eq!(h.controller.pixels()[1], PixelColor::BLACK);

    let cmd_z = KeyEvent {
        meta: true,
        ..KeyEvent::plain(Key::Char('Z'))
    };
    assert!(h.controller.handle_key(&cmd_z));
    assert_eq!(h.controller.pixels(), &[PixelColor::BLACK; 2]);
    assert!(h.controller.sync_state().is_pending());
}

#[test]
fn other_keys_are_not_consumed() {
    let mut h = harness(2, 1, MemoryStore::new());
    h.controller.update_pixel(0, PixelColor::rgb(1, 1, 1));

    assert!(!h.controller.handle_key(&KeyEvent::plain(Key::Char('z'))));
    assert!(!h.controller.handle_key(&KeyEvent {
        ctrl: true,
        ..KeyEvent::plain(Key::Char('y'))
    }));
    assert_eq!(h.controller.history().len(), 1);
}
