//! Skins, textures and summaries over an assembled player

mod common;

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use q3_md3::texture::{DecodedImage, Md3Texture, TextureCache};
use q3_md3::{Md3Error, NodeId, SceneGraph, Skin};

use common::player_part;

const SKIN: &str = "tag_torso,\nl_,models/players/sarge/default_l.tga\n\
                    u_torso,models/players/sarge/default_u.tga\n";

fn player() -> (SceneGraph, NodeId, NodeId) {
    let mut scene = SceneGraph::new();
    let lower = scene.insert(player_part("lower.md3", "l_legs", 2, &["tag_torso"]));
    let upper = scene.insert(player_part("upper.md3", "u_torso", 2, &["tag_head"]));
    scene.attach(lower, 0, upper).unwrap();
    (scene, lower, upper)
}

#[test]
fn test_skin_prefix_applies_through_the_scene() {
    let (mut scene, lower, upper) = player();
    let skin: Skin = SKIN.parse().unwrap();
    assert_eq!(skin.len(), 2);

    assert_eq!(scene.apply_skin(lower, &skin).unwrap(), 2);
    let legs = &scene.get(lower).unwrap().model.meshes[0];
    assert_eq!(legs.textures[0].name, "models/players/sarge/default_l.tga");
    let torso = &scene.get(upper).unwrap().model.meshes[0];
    assert_eq!(torso.textures[0].source, "models/players/sarge/default_u.tga");
}

#[test]
fn test_skin_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lower_default.skin");
    std::fs::write(&path, SKIN).unwrap();
    let skin = Skin::load(&path).unwrap();
    assert!(skin.texture("l_legs").is_some());
    assert!(skin.texture("h_head").is_none());
}

#[test]
fn test_texture_cache_binds_each_source_once() {
    let (mut scene, lower, upper) = player();
    scene
        .apply_texture(upper, &Md3Texture::named("models/shared.tga"))
        .unwrap();

    let loads = RefCell::new(Vec::new());
    let mut cache = TextureCache::new(|source: &str| {
        loads.borrow_mut().push(source.to_string());
        DecodedImage::from_pixels(1, 1, 24, &[1, 2, 3])
    });

    let bindings = cache.bind_scene(&scene, lower).unwrap();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].node, lower);
    assert_eq!(bindings[1].node, upper);
    assert_ne!(bindings[0].handle, bindings[1].handle);

    // Binding again resolves from the cache
    let again = cache.bind_scene(&scene, lower).unwrap();
    assert_eq!(again, bindings);
    assert_eq!(loads.borrow().len(), 2);

    let image = cache.image(bindings[1].handle).unwrap();
    assert_eq!(image.rgba, vec![1, 2, 3, 0xFF]);
}

#[test]
fn test_missing_textures_are_skipped() {
    let (scene, lower, _) = player();
    let mut cache = TextureCache::new(|source: &str| {
        Err::<DecodedImage, _>(Md3Error::Texture(format!("no such file {source}")))
    });
    let bindings = cache.bind_scene(&scene, lower).unwrap();
    assert!(bindings.is_empty());
    assert!(cache.is_empty());
}

#[test]
fn test_summary() {
    let (scene, lower, upper) = player();
    let summary = scene.summary(lower).unwrap();
    assert_eq!(summary.nodes.len(), 2);
    assert_eq!(summary.total_vertices, 6);
    assert_eq!(summary.total_triangles, 2);
    assert_eq!(summary.nodes[1].mesh_names, vec!["u_torso".to_string()]);

    let text = summary.to_string();
    assert!(text.contains("lower.md3"));
    assert!(text.contains("1 tag, 2 animation frames, 3 vertices, 1 triangle,"));
    assert!(text.contains("Totals: 6 vertices, 2 triangles"));

    assert_eq!(scene.summary(upper).unwrap().nodes.len(), 1);
}

#[test]
fn test_reattaching_moves_the_subtree() {
    let (mut scene, lower, upper) = player();
    let other = scene.insert(player_part("lower2.md3", "l_legs", 1, &["tag_torso"]));

    assert_eq!(scene.attach(other, 0, upper).unwrap(), None);
    assert_eq!(scene.get(lower).unwrap().child_at(0), None);
    assert_eq!(scene.get(upper).unwrap().parent(), Some(other));

    let removed = scene.remove(other).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(removed[0].load_name, "lower2.md3");
    assert!(!scene.contains(upper));
    assert!(scene.contains(lower));
}
