use futures_util::future::join_all;
use log::*;
use support::test_env::TestEnv;
use team_dispatch_engine::{
    db_types::{
        AssignmentSource,
        AssignmentStatus,
        AuditAction,
        AuditEntity,
        MemberStatus,
        OrderStatusType,
        QueueType,
        TeamRole,
    },
    helpers::Clock,
    traits::OrderGateway,
    DispatchError,
    SnatchApi,
};

mod support;

const CONTENDERS: i64 = 100;

fn leader_of(team_id: i64) -> i64 {
    1_000 + team_id
}

#[tokio::test]
async fn exactly_one_of_many_leaders_wins() {
    let env = TestEnv::new().await;
    env.team_order(900).await;
    for team_id in 1..=CONTENDERS {
        env.leader(team_id, leader_of(team_id)).await;
    }
    let api = SnatchApi::new(env.db.clone(), env.clock());
    let attempts = (1..=CONTENDERS).map(|team_id| {
        let api = &api;
        async move { (team_id, api.snatch_order(leader_of(team_id), 900, team_id).await) }
    });
    let results = join_all(attempts).await;

    let winners = results.iter().filter(|(_, r)| r.is_ok()).collect::<Vec<_>>();
    assert_eq!(winners.len(), 1, "exactly one leader must win");
    let conflicts = results.iter().filter(|(_, r)| matches!(r, Err(DispatchError::AssignmentConflict(_)))).count();
    assert_eq!(conflicts as i64, CONTENDERS - 1);
    let (winning_team, winner) = winners[0];
    let winner = winner.as_ref().expect("winner has an assignment");
    info!("🏁️ Team #{winning_team} won assignment #{}", winner.id);
    assert_eq!(winner.team_id, *winning_team);
    assert_eq!(winner.status, AssignmentStatus::Dispatching);
    assert_eq!(winner.locked_at, Some(env.clock.now()));

    let order = env.db.read_for_claim(900).await.unwrap().expect("order exists");
    assert_eq!(order.assigned_team_id, Some(*winning_team));
    assert_eq!(order.assignment_source, Some(AssignmentSource::Team));
    let history = api.assignment_history(900).await.unwrap();
    assert_eq!(history.len(), 1);
    let audit = env.db.audit_entries_for(AuditEntity::Order, 900).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::AssignTeam);
    assert_eq!(audit[0].actor_user_id, Some(leader_of(*winning_team)));
    env.tear_down().await;
}

#[tokio::test]
async fn ineligible_orders_are_not_claimed() {
    let env = TestEnv::new().await;
    env.leader(1, 11).await;
    env.db.insert_order(901, OrderStatusType::Confirmed, QueueType::Team).await.unwrap();
    env.db.insert_order(902, OrderStatusType::Pending, QueueType::Individual).await.unwrap();
    let api = SnatchApi::new(env.db.clone(), env.clock());
    for order_id in [901, 902] {
        let before = env.db.read_for_claim(order_id).await.unwrap().unwrap();
        let err = api.snatch_order(11, order_id, 1).await.expect_err("order is not eligible");
        assert!(matches!(err, DispatchError::OrderNotEligible(_)), "order #{order_id}: {err}");
        let after = env.db.read_for_claim(order_id).await.unwrap().unwrap();
        assert_eq!(after.assigned_team_id, before.assigned_team_id);
        assert_eq!(after.updated_at, before.updated_at);
        assert!(api.assignment_history(order_id).await.unwrap().is_empty());
    }
    let err = api.snatch_order(11, 999, 1).await.expect_err("order does not exist");
    assert!(matches!(err, DispatchError::NotFound(_)));
    env.tear_down().await;
}

#[tokio::test]
async fn only_active_leaders_may_snatch() {
    let env = TestEnv::new().await;
    env.team_order(903).await;
    env.member(1, 12, MemberStatus::Active).await;
    env.db.upsert_team_member(2, 13, TeamRole::Leader, MemberStatus::Inactive).await.unwrap();
    let api = SnatchApi::new(env.db.clone(), env.clock());
    for (user, team) in [(12, 1), (13, 2), (14, 3), (12, 2)] {
        let err = api.snatch_order(user, 903, team).await.expect_err("not an active leader");
        assert!(matches!(err, DispatchError::PermissionDenied(_)), "user #{user}, team #{team}: {err}");
    }
    assert!(api.current_assignment(903).await.unwrap().is_none());
    env.tear_down().await;
}

#[tokio::test]
async fn released_orders_can_be_snatched_again() {
    let env = TestEnv::new().await;
    env.team_order(904).await;
    env.leader(1, 11).await;
    env.leader(2, 21).await;
    let api = SnatchApi::new(env.db.clone(), env.clock());
    let first = api.snatch_order(11, 904, 1).await.expect("first snatch");
    let err = api.snatch_order(21, 904, 2).await.expect_err("order is taken");
    assert!(err.is_conflict());

    let err = api.release_assignment(21, 904, 2).await.expect_err("team #2 does not own the claim");
    assert!(err.is_conflict());
    let released = api.release_assignment(11, 904, 1).await.expect("owner releases");
    assert_eq!(released.id, first.id);
    assert_eq!(released.status, AssignmentStatus::Released);
    assert!(released.released_at.is_some());
    let order = env.db.read_for_claim(904).await.unwrap().unwrap();
    assert_eq!(order.assigned_team_id, None);
    let err = api.release_assignment(11, 904, 1).await.expect_err("already released");
    assert!(err.is_conflict());

    let second = api.snatch_order(21, 904, 2).await.expect("order is free again");
    assert_ne!(second.id, first.id);
    let current = api.current_assignment(904).await.unwrap().expect("there is a current assignment");
    assert_eq!(current.id, second.id);
    let history = api.assignment_history(904).await.unwrap();
    let statuses = history.iter().map(|a| a.status).collect::<Vec<_>>();
    assert_eq!(statuses, vec![AssignmentStatus::Released, AssignmentStatus::Dispatching]);
    let order = env.db.read_for_claim(904).await.unwrap().unwrap();
    assert_eq!(order.assigned_team_id, Some(2));
    let audit = env.db.audit_entries_for(AuditEntity::Assignment, first.id).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::Release);
    env.tear_down().await;
}
