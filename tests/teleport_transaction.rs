mod common;

use common::{allow_travel, at, fixture, Fixture};
use homebound::homes::{
    permissions, HomeError, PlayerId, TeleportRequest, TeleportStage, TeleportTransaction,
};
use uuid::Uuid;

/// Online player with a 50 gold teleport home and `gold` in the bank.
fn paying_player(fx: &Fixture, gold: f64) -> PlayerId {
    let player = Uuid::new_v4();
    fx.host.worlds.place(player, at("overworld", 0.0, 64.0, 0.0));
    fx.homes.set_home(player, "base", at("overworld", 100.0, 70.0, 100.0));
    fx.host
        .permissions
        .grant(player, permissions::tp_from_world("overworld"));
    fx.host
        .permissions
        .grant_with_arg(player, permissions::tp_to_world("overworld"), "gold: 50");
    fx.host.bank.deposit(player, "gold", gold);
    player
}

fn position_of(fx: &Fixture, player: PlayerId) -> Option<homebound::homes::Location> {
    use homebound::homes::WorldService;
    fx.host.worlds.player_location(player)
}

#[test]
fn successful_teleport_charges_and_moves() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);

    let receipt = fx.homes.teleport_home(player, "base").unwrap();
    assert_eq!(receipt.charged.get("gold"), Some(50.0));
    assert_eq!(receipt.home.name, "base");
    assert_eq!(fx.host.bank.balance(player, "gold"), 30.0);
    assert_eq!(
        position_of(&fx, player),
        Some(at("overworld", 100.0, 70.0, 100.0))
    );
}

#[test]
fn insufficient_funds_reports_full_ledger_and_charges_nothing() {
    let fx = fixture();
    let player = paying_player(&fx, 30.0);

    let err = fx.homes.teleport_home(player, "base").unwrap_err();
    match err {
        HomeError::InsufficientFunds { ledger } => {
            assert_eq!(ledger.get("gold"), Some(50.0));
            assert_eq!(ledger.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.host.bank.balance(player, "gold"), 30.0);
    assert_eq!(position_of(&fx, player), Some(at("overworld", 0.0, 64.0, 0.0)));
}

#[test]
fn vanished_world_fails_without_charging() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    fx.homes.set_home(player, "sky", at("skylands", 0.0, 200.0, 0.0));
    allow_travel(&fx.host, player, "skylands");

    assert!(matches!(
        fx.homes.teleport_home(player, "sky"),
        Err(HomeError::NoSuchWorld(world)) if world == "skylands"
    ));
    assert_eq!(fx.host.bank.balance(player, "gold"), 80.0);
}

#[test]
fn unknown_home_is_not_found() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    assert!(matches!(
        fx.homes.teleport_home(player, "nowhere"),
        Err(HomeError::NotFound { .. })
    ));
}

#[test]
fn missing_permission_stops_before_any_charge() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    fx.host
        .permissions
        .revoke(player, &permissions::tp_from_world("overworld"));

    assert!(matches!(
        fx.homes.teleport_home(player, "base"),
        Err(HomeError::MissingPermission { .. })
    ));
    assert_eq!(fx.host.bank.balance(player, "gold"), 80.0);
}

#[test]
fn failed_move_refunds_the_charge() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    fx.host.worlds.set_fail_moves(true);

    assert!(matches!(
        fx.homes.teleport_home(player, "base"),
        Err(HomeError::MoveFailed(_))
    ));
    assert_eq!(fx.host.bank.balance(player, "gold"), 80.0);
    assert_eq!(position_of(&fx, player), Some(at("overworld", 0.0, 64.0, 0.0)));

    fx.host.worlds.set_fail_moves(false);
    fx.homes.teleport_home(player, "base").unwrap();
    assert_eq!(fx.host.bank.balance(player, "gold"), 30.0);
}

#[test]
fn unrecognised_currency_aborts_the_teleport() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    fx.host
        .permissions
        .grant_with_arg(player, permissions::tp_to_world("overworld"), "gems: 1");

    assert!(matches!(
        fx.homes.teleport_home(player, "base"),
        Err(HomeError::UnrecognisedCurrency(currency)) if currency == "gems"
    ));
    assert_eq!(position_of(&fx, player), Some(at("overworld", 0.0, 64.0, 0.0)));
}

#[test]
fn offline_traveller_cannot_teleport() {
    let fx = fixture();
    let player = paying_player(&fx, 80.0);
    fx.host.worlds.log_off(player);

    assert!(matches!(
        fx.homes.teleport_home(player, "base"),
        Err(HomeError::PlayerOffline(_))
    ));
    assert_eq!(fx.host.bank.balance(player, "gold"), 80.0);
}

#[test]
fn free_teleport_skips_charging() {
    let fx = fixture();
    let player = Uuid::new_v4();
    fx.host.worlds.place(player, at("nether", 0.0, 64.0, 0.0));
    fx.homes.set_home(player, "", at("nether", 5.0, 64.0, 5.0));
    allow_travel(&fx.host, player, "nether");

    let receipt = fx.homes.teleport_home(player, "").unwrap();
    assert!(receipt.charged.is_empty());
    assert_eq!(position_of(&fx, player), Some(at("nether", 5.0, 64.0, 5.0)));
}

#[test]
fn transaction_stops_at_the_failing_stage() {
    let fx = fixture();
    let player = paying_player(&fx, 30.0);
    let services = fx.host.services();

    let mut tx = TeleportTransaction::new(
        fx.homes.registry(),
        &services,
        fx.homes.costs(),
        TeleportRequest::Own {
            player,
            home: "base".into(),
        },
    );
    assert_eq!(tx.stage(), TeleportStage::Start);
    assert!(tx.execute().is_err());
    assert_eq!(tx.stage(), TeleportStage::CostComputed);

    fx.host.bank.deposit(player, "gold", 20.0);
    let mut tx = TeleportTransaction::new(
        fx.homes.registry(),
        &services,
        fx.homes.costs(),
        TeleportRequest::Own {
            player,
            home: "base".into(),
        },
    );
    tx.execute().unwrap();
    assert_eq!(tx.stage(), TeleportStage::Moved);
}

#[test]
fn admin_teleport_to_someone_elses_home_is_free() {
    let fx = fixture();
    let owner = paying_player(&fx, 0.0);
    let admin = Uuid::new_v4();
    fx.host.worlds.place(admin, at("nether", 0.0, 0.0, 0.0));

    assert!(matches!(
        fx.homes.teleport_to_home_of(admin, owner, "base"),
        Err(HomeError::MissingPermission { ref permission, .. }) if permission == "homes.admin.tp.me"
    ));

    fx.host
        .permissions
        .grant(admin, permissions::PERMISSION_HOMES_ADMIN_TP_ME);
    let receipt = fx.homes.teleport_to_home_of(admin, owner, "base").unwrap();
    assert!(receipt.charged.is_empty());
    assert_eq!(receipt.traveller, admin);
    assert_eq!(
        position_of(&fx, admin),
        Some(at("overworld", 100.0, 70.0, 100.0))
    );
}

#[test]
fn admin_sending_players_needs_the_matching_permission() {
    let fx = fixture();
    let owner = paying_player(&fx, 0.0);
    let bystander = Uuid::new_v4();
    fx.host.worlds.place(bystander, at("nether", 0.0, 0.0, 0.0));
    let admin = Uuid::new_v4();
    fx.host
        .permissions
        .grant(admin, permissions::PERMISSION_HOMES_ADMIN_TP_THEM);

    fx.homes
        .teleport_other_to_home_of(admin, owner, owner, "base")
        .unwrap();
    assert_eq!(fx.host.bank.balance(owner, "gold"), 0.0);

    assert!(matches!(
        fx.homes.teleport_other_to_home_of(admin, bystander, owner, "base"),
        Err(HomeError::MissingPermission { ref permission, .. }) if permission == "homes.admin.tp.other"
    ));

    fx.host
        .permissions
        .grant(admin, permissions::PERMISSION_HOMES_ADMIN_TP_OTHER);
    fx.homes
        .teleport_other_to_home_of(admin, bystander, owner, "base")
        .unwrap();
    assert_eq!(
        position_of(&fx, bystander),
        Some(at("overworld", 100.0, 70.0, 100.0))
    );
}
