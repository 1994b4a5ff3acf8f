//! Registry lifecycle and slot-table validity properties.

use std::sync::Arc;

use gs_texture_pool::{DeviceHandle, TextureInput, TexturePool, TextureUploader};
use pretty_assertions::assert_eq;

struct CountingDevice(u32);

impl TextureUploader for CountingDevice {
    fn create_texture(&mut self, _w: u32, _h: u32, _rgba: &[u8]) -> DeviceHandle {
        self.0 += 1;
        DeviceHandle(self.0)
    }
}

fn pool() -> TexturePool {
    TexturePool::new(&mut CountingDevice(1000))
}

fn input(page: &str, name: &str, handle: u32) -> TextureInput {
    TextureInput {
        page_name: page.to_string(),
        name: name.to_string(),
        combo_id: 0,
        width: 32,
        height: 32,
        handle: DeviceHandle(handle),
        common: false,
        data: Arc::from(vec![0u8; 32 * 32 * 4]),
    }
}

#[test]
fn bound_addresses_never_go_absent() {
    let pool = pool();
    let key = pool.register_instance(&input("level1", "rock", 1));
    pool.move_existing_to_vram(key, 512);

    // Through every lifecycle transition the slot keeps answering.
    assert!(pool.lookup(512).is_some());
    pool.deregister_instance("level1-rock", DeviceHandle(1));
    assert!(pool.lookup(512).is_some());
    pool.register_instance(&input("level1", "rock", 2));
    assert!(pool.lookup(512).is_some());
    pool.deregister_instance("level1-rock", DeviceHandle(2));
    assert!(pool.lookup(512).is_some());
    pool.verify();
}

#[test]
fn two_levels_unload_in_either_order() {
    // Both levels A and B carry a copy of the same texture.
    let pool = pool();
    let key = pool.register_instance(&input("shared", "door", 10));
    pool.register_instance(&input("shared", "door", 11));
    pool.move_existing_to_vram(key, 700);
    assert_eq!(pool.lookup(700), Some(DeviceHandle(10)));

    // A unloads first; B's copy takes over.
    pool.deregister_instance("shared-door", DeviceHandle(10));
    assert_eq!(pool.lookup(700), Some(DeviceHandle(11)));
    assert!(!pool.texture_meta(key).is_placeholder);

    // B unloads too; the slot degrades to the placeholder, never to absent.
    pool.deregister_instance("shared-door", DeviceHandle(11));
    assert_eq!(pool.lookup(700), Some(pool.placeholder_handle()));
    assert!(pool.texture_meta(key).is_placeholder);
    pool.verify();
}

#[test]
fn reload_after_full_unload_reuses_the_entry() {
    let pool = pool();
    let key = pool.register_instance(&input("level1", "rock", 20));
    pool.move_existing_to_vram(key, 900);
    pool.deregister_instance("level1-rock", DeviceHandle(20));
    assert_eq!(pool.lookup(900), Some(pool.placeholder_handle()));

    // The level loads again with a fresh device copy; the old binding
    // resolves to it without being re-established.
    let key2 = pool.register_instance(&input("level1", "rock", 21));
    assert_eq!(key, key2);
    assert_eq!(pool.lookup(900), Some(DeviceHandle(21)));
}

#[test]
fn duplicate_unload_messages_are_tolerated() {
    let pool = pool();
    let key = pool.register_instance(&input("level1", "rock", 30));
    pool.move_existing_to_vram(key, 40);
    pool.deregister_instance("level1-rock", DeviceHandle(30));
    pool.deregister_instance("level1-rock", DeviceHandle(30));
    assert_eq!(pool.lookup(40), Some(pool.placeholder_handle()));
}

#[test]
fn register_instance_at_binds_immediately() {
    let pool = pool();
    let key = pool.register_instance_at(&input("level1", "hud", 77), 1234);
    assert_eq!(pool.lookup(1234), Some(DeviceHandle(77)));
    assert_eq!(pool.lookup_source(1234), Some(key));
}

#[test]
fn find_resolves_registered_names_only() {
    let pool = pool();
    let key = pool.register_instance(&input("level1", "rock", 1));
    assert_eq!(pool.find("level1-rock"), Some(key));
    assert_eq!(pool.find("level1-missing"), None);
}

#[test]
fn concurrent_reads_see_only_valid_handles() {
    let pool = pool();
    let key = pool.register_instance(&input("level1", "rock", 1));
    pool.move_existing_to_vram(key, 300);
    let placeholder = pool.placeholder_handle();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..20_000 {
                    let handle = pool.lookup(300).expect("slot must stay bound");
                    assert!(
                        handle == placeholder || (handle.0 >= 1 && handle.0 <= 2),
                        "unexpected handle {}",
                        handle.0
                    );
                }
            });
        }
        scope.spawn(|| {
            for round in 0..500 {
                let handle = 1 + (round % 2);
                pool.register_instance(&input("level1", "rock", handle));
                pool.deregister_instance("level1-rock", DeviceHandle(handle));
            }
        });
    });
    pool.verify();
}
