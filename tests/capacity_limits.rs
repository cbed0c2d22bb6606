mod common;

use common::{allow_homes, at, fixture, fixture_with};
use homebound::homes::memory::BoxZone;
use homebound::homes::{permissions, CapScope, HomeError, OverwritePolicy, Position};
use uuid::Uuid;

#[test]
fn world_cap_blocks_third_home_but_not_overwrite() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &[]);
    fx.host
        .permissions
        .grant_with_arg(player, permissions::add_in_world("W"), "2");

    fx.homes.request_set_home(player, "a", at("W", 0.0, 0.0, 0.0)).unwrap();
    fx.homes.request_set_home(player, "b", at("W", 10.0, 0.0, 0.0)).unwrap();

    let err = fx
        .homes
        .request_set_home(player, "c", at("W", 20.0, 0.0, 0.0))
        .unwrap_err();
    match err {
        HomeError::CapacityReached { scope, cap } => {
            assert_eq!(scope, CapScope::World("W".into()));
            assert_eq!(cap, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.homes.list_home_names(player), vec!["a", "b"]);

    let replaced = fx
        .homes
        .request_set_home(player, "a", at("W", 99.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(replaced.unwrap().location.position.x, 0.0);
    assert_eq!(fx.homes.get_home(player, "a").unwrap().location.position.x, 99.0);
    assert_eq!(fx.homes.list_home_names(player).len(), 2);
}

#[test]
fn missing_server_permission_means_no_homes() {
    let fx = fixture();
    let player = Uuid::new_v4();
    fx.host
        .permissions
        .grant(player, permissions::add_in_world("overworld"));

    let err = fx
        .homes
        .request_set_home(player, "", at("overworld", 0.0, 64.0, 0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        HomeError::CapacityReached {
            scope: CapScope::Server,
            cap: 0
        }
    ));
    assert!(!fx.homes.registry().has(player));
}

#[test]
fn missing_world_permission_is_reported_by_key() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &["overworld"]);

    let err = fx
        .homes
        .request_set_home(player, "lava", at("nether", 0.0, 30.0, 0.0))
        .unwrap_err();
    match err {
        HomeError::MissingPermission { permission, .. } => {
            assert_eq!(permission, "homes.personal.add.inworld.nether")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparsable_cap_argument_means_unlimited() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, Some("plenty"), &["overworld"]);

    for i in 0..20 {
        fx.homes
            .request_set_home(player, &format!("h{i}"), at("overworld", i as f64, 0.0, 0.0))
            .unwrap();
    }
    assert_eq!(fx.homes.list_homes(player).len(), 20);
}

#[test]
fn zone_caps_only_count_homes_inside_the_zone() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &["overworld"]);
    fx.host.zones.add(BoxZone::new(
        "spawn",
        "overworld",
        Position::new(-50.0, 0.0, -50.0),
        Position::new(50.0, 255.0, 50.0),
    ));
    fx.host
        .permissions
        .grant_with_arg(player, permissions::add_in_zone("spawn"), "1");

    fx.homes.request_set_home(player, "inside", at("overworld", 0.0, 64.0, 0.0)).unwrap();
    fx.homes.request_set_home(player, "outside", at("overworld", 500.0, 64.0, 0.0)).unwrap();

    let err = fx
        .homes
        .request_set_home(player, "inside2", at("overworld", 10.0, 64.0, 10.0))
        .unwrap_err();
    assert!(matches!(
        err,
        HomeError::CapacityReached { scope: CapScope::Zone(ref zone), cap: 1 } if zone == "spawn"
    ));
}

#[test]
fn zone_without_permission_cannot_hold_homes() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &["overworld"]);
    fx.host.zones.add(BoxZone::new(
        "vault",
        "overworld",
        Position::new(0.0, 0.0, 0.0),
        Position::new(10.0, 10.0, 10.0),
    ));

    let err = fx
        .homes
        .request_set_home(player, "heist", at("overworld", 5.0, 5.0, 5.0))
        .unwrap_err();
    assert!(matches!(
        err,
        HomeError::MissingPermission { ref permission, .. } if permission == "homes.personal.add.inzone.vault"
    ));
}

#[test]
fn most_restrictive_violated_scope_is_reported() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, Some("2"), &[]);
    fx.host
        .permissions
        .grant_with_arg(player, permissions::add_in_world("overworld"), "1");
    fx.homes.set_home(player, "a", at("overworld", 0.0, 0.0, 0.0));
    fx.homes.set_home(player, "b", at("overworld", 1.0, 0.0, 0.0));

    let err = fx
        .homes
        .request_set_home(player, "c", at("overworld", 2.0, 0.0, 0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        HomeError::CapacityReached { scope: CapScope::World(_), cap: 1 }
    ));
}

#[test]
fn overwrite_is_exempt_even_when_over_cap() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, Some("1"), &["overworld", "nether"]);
    fx.homes.set_home(player, "a", at("overworld", 0.0, 0.0, 0.0));
    fx.homes.set_home(player, "b", at("overworld", 1.0, 0.0, 0.0));
    fx.homes.set_home(player, "c", at("overworld", 2.0, 0.0, 0.0));

    fx.homes.request_set_home(player, "b", at("nether", 7.0, 0.0, 0.0)).unwrap();
    assert_eq!(fx.homes.get_home(player, "b").unwrap().location.world_id, "nether");
    assert!(fx
        .homes
        .request_set_home(player, "d", at("overworld", 3.0, 0.0, 0.0))
        .is_err());
}

#[test]
fn check_new_scope_policy_caps_overwrites_that_move_scope() {
    let fx = fixture_with(|config| config.capacity.overwrite_policy = OverwritePolicy::CheckNewScope);
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &["overworld"]);
    fx.host
        .permissions
        .grant_with_arg(player, permissions::add_in_world("nether"), "1");
    fx.homes.set_home(player, "a", at("nether", 0.0, 0.0, 0.0));
    fx.homes.set_home(player, "b", at("overworld", 0.0, 0.0, 0.0));

    let err = fx
        .homes
        .request_set_home(player, "b", at("nether", 5.0, 0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, HomeError::CapacityReached { cap: 1, .. }));
    assert_eq!(fx.homes.get_home(player, "b").unwrap().location.world_id, "overworld");

    // Moving within the same world excludes the home being replaced.
    fx.homes.request_set_home(player, "a", at("nether", 9.0, 0.0, 0.0)).unwrap();
}

#[test]
fn set_home_here_uses_current_location() {
    let fx = fixture();
    let player = Uuid::new_v4();
    allow_homes(&fx.host, player, None, &["overworld"]);

    assert!(matches!(
        fx.homes.request_set_home_here(player, ""),
        Err(HomeError::PlayerOffline(p)) if p == player
    ));

    fx.host.worlds.place(player, at("overworld", 12.0, 70.0, -4.0));
    fx.homes.request_set_home_here(player, "").unwrap();
    let home = fx.homes.get_home(player, "").unwrap();
    assert!(home.is_default());
    assert_eq!(home.location, at("overworld", 12.0, 70.0, -4.0));
}

#[test]
fn deleting_the_last_home_removes_the_player() {
    let fx = fixture();
    let player = Uuid::new_v4();
    fx.homes.set_home(player, "only", at("overworld", 0.0, 0.0, 0.0));

    assert!(matches!(
        fx.homes.delete_home(player, "other"),
        Err(HomeError::NotFound { .. })
    ));
    fx.homes.delete_home(player, "only").unwrap();
    assert!(!fx.homes.registry().has(player));
    assert!(fx.homes.players_with_homes().is_empty());
    assert!(matches!(
        fx.homes.delete_home(player, "only"),
        Err(HomeError::PlayerNotFound(_))
    ));
}
