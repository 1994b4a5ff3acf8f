//! Upload/relocate protocol scenarios against synthetic page images.

use std::sync::Arc;

use gs_texture_pool::{
    DeviceHandle, TextureInput, TexturePool, TextureUploader, UploadError, UploadMode,
};
use gs_tpage::encode::PageImageBuilder;
use gs_tpage::psm;
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
fn upload_before_load_binds_placeholder_then_converges() {
    let pool = pool();
    let image = PageImageBuilder::new("skypage")
        .texture("sky", |t| t.dest[0] = 8064)
        .build();

    // The game uploads before the loader has delivered "sky".
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    assert_eq!(pool.lookup(8064), Some(pool.placeholder_handle()));
    let key = pool.lookup_source(8064).expect("slot has an owner");
    assert!(pool.texture_meta(key).is_placeholder);

    // The loader catches up; the existing binding refreshes.
    pool.register_instance(&input("skypage", "sky", 7));
    assert_eq!(pool.lookup(8064), Some(DeviceHandle(7)));
    assert_eq!(pool.lookup_source(8064), Some(key));
    pool.verify();
}

#[test]
fn load_before_upload_converges_to_the_same_state() {
    let pool = pool();
    pool.register_instance(&input("skypage", "sky", 7));

    let image = PageImageBuilder::new("skypage")
        .texture("sky", |t| t.dest[0] = 8064)
        .build();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    assert_eq!(pool.lookup(8064), Some(DeviceHandle(7)));
    pool.verify();
}

#[test]
fn relocate_shares_the_distinct_texture() {
    let pool = pool();
    let image = PageImageBuilder::new("skypage")
        .texture("sky", |t| t.dest[0] = 8064)
        .build();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    pool.register_instance(&input("skypage", "sky", 7));

    pool.relocate(9000, 8064, u32::from(psm::CT32));
    assert_eq!(pool.lookup(9000), Some(DeviceHandle(7)));
    assert_eq!(pool.lookup_source(9000), pool.lookup_source(8064));

    // The copy stays live through a reload cycle at the new address too.
    pool.deregister_instance("skypage-sky", DeviceHandle(7));
    assert_eq!(pool.lookup(9000), Some(pool.placeholder_handle()));
    pool.register_instance(&input("skypage", "sky", 8));
    assert_eq!(pool.lookup(9000), Some(DeviceHandle(8)));
    pool.verify();
}

#[test]
fn sentinel_entries_leave_prior_bindings_untouched() {
    let pool = pool();
    let first = PageImageBuilder::new("page")
        .texture("grass", |t| t.dest[0] = 100)
        .build();
    pool.handle_upload(first.page_bytes(), UploadMode::Full, &first.memory, first.nil)
        .unwrap();
    pool.register_instance(&input("page", "grass", 5));
    assert_eq!(pool.lookup(100), Some(DeviceHandle(5)));

    // A later revision of the page carries a hole where "grass" was.
    let revised = PageImageBuilder::new("page")
        .sentinel()
        .texture("dirt", |t| t.dest[0] = 200)
        .build();
    pool.handle_upload(
        revised.page_bytes(),
        UploadMode::Full,
        &revised.memory,
        revised.nil,
    )
    .unwrap();
    assert_eq!(pool.lookup(100), Some(DeviceHandle(5)));
    assert_eq!(pool.lookup(200), Some(pool.placeholder_handle()));
}

#[test]
fn paired_format_lands_in_the_paired_table() {
    let pool = pool();
    let image = PageImageBuilder::new("fontpage")
        .texture("font", |t| {
            t.psm = psm::T4HH;
            t.dest[0] = 4000;
        })
        .build();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();

    assert_eq!(pool.lookup(4000), None);
    assert_eq!(pool.lookup_paired(4000), Some(pool.placeholder_handle()));

    pool.register_instance(&input("fontpage", "font", 9));
    assert_eq!(pool.lookup_paired(4000), Some(DeviceHandle(9)));
    assert_eq!(
        pool.lookup_paired_source(4000),
        pool.find("fontpage-font")
    );
    pool.verify();
}

#[test]
fn relocate_in_paired_format_targets_the_paired_table() {
    let pool = pool();
    let image = PageImageBuilder::new("fontpage")
        .texture("font", |t| t.dest[0] = 4000)
        .build();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    pool.register_instance(&input("fontpage", "font", 9));

    pool.relocate(4100, 4000, u32::from(psm::T4HH));
    assert_eq!(pool.lookup(4100), None);
    assert_eq!(pool.lookup_paired(4100), Some(DeviceHandle(9)));
}

#[test]
fn segment_mask_limits_which_mips_bind() {
    let pool = pool();
    let image = PageImageBuilder::new("page")
        .texture("ground", |t| {
            t.num_mips = 3;
            t.dest = [300, 400, 500, 0, 0, 0, 0];
        })
        .build();

    // Mip 0 is segment 2, mip 1 segment 1, mip 2 segment 0.
    pool.handle_upload(
        image.page_bytes(),
        UploadMode::Segments([false, false, true]),
        &image.memory,
        image.nil,
    )
    .unwrap();
    assert!(pool.lookup(300).is_some());
    assert_eq!(pool.lookup(400), None);
    assert_eq!(pool.lookup(500), None);

    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    assert!(pool.lookup(400).is_some());
    assert!(pool.lookup(500).is_some());
    pool.verify();
}

#[test]
fn truncated_pointer_table_fails_without_binding() {
    let pool = pool();
    let image = PageImageBuilder::new("page")
        .texture("grass", |t| t.dest[0] = 100)
        .build();
    let page_bytes = image.page_bytes();
    let truncated = &page_bytes[..gs_tpage::TEXTURE_PAGE_HEADER_SIZE];

    let err = pool
        .handle_upload(truncated, UploadMode::Full, &image.memory, image.nil)
        .unwrap_err();
    assert!(matches!(err, UploadError::Layout(_)));
    assert_eq!(pool.lookup(100), None);
}

#[test]
fn destination_beyond_vram_is_rejected() {
    let pool = pool();
    let image = PageImageBuilder::new("page")
        .texture("huge", |t| t.dest[0] = 0x4000) // first block past 4 MiB
        .build();
    let err = pool
        .handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap_err();
    assert_eq!(err, UploadError::AddressOutOfRange(0x4000));
}

#[test]
fn upload_twice_is_stable() {
    let pool = pool();
    let image = PageImageBuilder::new("page")
        .texture("grass", |t| t.dest[0] = 100)
        .build();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();
    pool.handle_upload(image.page_bytes(), UploadMode::Full, &image.memory, image.nil)
        .unwrap();

    let stats = pool.stats();
    assert_eq!(stats.distinct_textures, 1);
    assert_eq!(stats.bound_slots, 1);
    pool.verify();
}
