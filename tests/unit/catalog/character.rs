use super::*;

#[test]
fn builtin_catalog_matches_shipped_animals() {
    let cat = Catalog::builtin();
    let names: Vec<&str> = cat.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Lion", "Tiger", "Hippopotamus", "Goldfinch", "Eagle"]
    );
    let finch = cat.get(3).unwrap();
    assert_eq!(finch.scale, Vec3::splat(30.0));
    assert_eq!(finch.rotation, Vec3::new(0.0, 180.0, 0.0));
    assert!(Catalog::new(builtin_characters()).is_ok());
}

#[test]
fn navigation_wraps_both_ways() {
    let cat = Catalog::builtin();
    assert_eq!(cat.next_index(4), 0);
    assert_eq!(cat.previous_index(0), 4);
    for i in 0..cat.len() {
        assert_eq!(cat.previous_index(cat.next_index(i)), i);
        assert_eq!(cat.next_index(cat.previous_index(i)), i);
    }
}

#[test]
fn single_entry_catalog_navigates_to_itself() {
    let cat = Catalog::new(vec![Character::new("a", "A", "a.glb")]).unwrap();
    assert_eq!(cat.next_index(0), 0);
    assert_eq!(cat.previous_index(0), 0);
}

#[test]
fn rejects_empty_duplicate_and_non_finite() {
    assert!(Catalog::new(vec![]).is_err());
    assert!(
        Catalog::new(vec![
            Character::new("a", "A", "a.glb"),
            Character::new("a", "B", "b.glb"),
        ])
        .is_err()
    );
    assert!(
        Catalog::new(vec![
            Character::new("a", "A", "a.glb").with_scale(Vec3::new(1.0, f32::INFINITY, 1.0))
        ])
        .is_err()
    );
}

#[test]
fn character_json_defaults() {
    let c: Character =
        serde_json::from_str(r#"{ "id": "x", "name": "X", "asset": "x.glb" }"#).unwrap();
    assert_eq!(c.scale, Vec3::ONE);
    assert_eq!(c.position, Vec3::ZERO);
    assert_eq!(c.idle_clip, None);
    assert_eq!(c.clip_loop, LoopMode::Repeat);
}
