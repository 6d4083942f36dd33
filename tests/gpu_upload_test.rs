#[cfg(feature = "integration-tests")]
use crate::common::test_utils::{TestLevel, dxt1_texture, entity, quad_model};
#[cfg(feature = "integration-tests")]
use xblock_ngin::{GpuContext, NO_TEXTURE, load_scene};

#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn headless() -> Option<GpuContext> {
    match futures::executor::block_on(GpuContext::new_headless()) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test, no adapter: {err:#}");
            None
        }
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_level_to_the_gpu() {
    xblock_ngin::init_logging();
    let Some(mut ctx) = headless() else {
        return;
    };
    let level = TestLevel::new();
    level.model("rocks/lod0/rock01.nif", &quad_model("Rock01:0"));
    level.texture("rocks/rock01.dds", &dxt1_texture(8, 8));
    let descriptor = level.descriptor(&entity("Rock01_", "rock_a", "0, 0, 0", "0, 0, 0"));

    let scene = load_scene(&descriptor, &level.config, &mut ctx);
    assert_eq!(scene.len(), 1);
    let object = &scene.objects[0];
    let mesh = object.mesh.as_ref().expect("mesh uploaded");
    let gpu_mesh = ctx.mesh(mesh.handle).expect("mesh registered");
    assert_eq!(gpu_mesh.num_elements, 6);
    assert_eq!(ctx.mesh_count(), 1);

    let bc_supported = ctx
        .device
        .features()
        .contains(wgpu::Features::TEXTURE_COMPRESSION_BC);
    assert_eq!(object.texture != NO_TEXTURE, bc_supported);
    // unresolved handles draw with the fallback
    let _ = ctx.texture(NO_TEXTURE);

    scene.release(&mut ctx);
    assert_eq!(ctx.mesh_count(), 0);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_fall_back_for_unaligned_textures() {
    let Some(mut ctx) = headless() else {
        return;
    };
    let level = TestLevel::new();
    level.model("rocks/lod0/pebble.nif", &quad_model("pebble"));
    level.texture("rocks/pebble.dds", &dxt1_texture(6, 6));
    let descriptor = level.descriptor(&entity("pebble", "p", "0, 0, 0", "0, 0, 0"));

    let scene = load_scene(&descriptor, &level.config, &mut ctx);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.objects[0].texture, NO_TEXTURE);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_textures_declaring_too_many_levels() {
    use xblock_ngin::{
        Uploader,
        resources::dds::{BlockFormat, DdsTexture, MipLevel},
    };

    let Some(mut ctx) = headless() else {
        return;
    };
    if !ctx
        .device
        .features()
        .contains(wgpu::Features::TEXTURE_COMPRESSION_BC)
    {
        return;
    }
    // 4x4, 2x2 and 1x1 followed by three more 1x1 levels
    let mut levels = vec![
        MipLevel { width: 4, height: 4, data: vec![0; 8] },
        MipLevel { width: 2, height: 2, data: vec![0; 8] },
    ];
    levels.extend((0..4).map(|_| MipLevel { width: 1, height: 1, data: vec![0; 8] }));
    let dds = DdsTexture {
        width: 4,
        height: 4,
        linear_size: 8,
        mip_count: 6,
        format: BlockFormat::Bc1,
        levels,
    };

    let handle = ctx.upload_texture("overlong chain", &dds).expect("upload");
    assert_ne!(handle, NO_TEXTURE);
    assert_eq!(ctx.texture(handle).texture.mip_level_count(), 3);
}
