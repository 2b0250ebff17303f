use std::path::Path;

use avatar_sprites::{FailurePolicy, SpritesConfig};

#[test]
fn shipped_config_parses_and_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/sprites.ron");
    let (cfg, used, errors) = SpritesConfig::load_layered([&path]);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(used.len(), 1);
    assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    assert_eq!(cfg.github.tile_size, 64);
    assert_eq!(cfg.testimonials.tile_size, 72);
    assert_eq!(cfg.testimonials.manifest, None);
    assert_eq!(cfg.github.on_failure, FailurePolicy::Placeholder);
    assert!(cfg.webp.exclude.iter().any(|d| d == "node_modules"));

    let direct = SpritesConfig::load_from_file(&path).unwrap();
    assert_eq!(direct, cfg);
}
