mod common;

use std::sync::Arc;

use common::{
    channel, member, role, DirectoryState, FakeDirectory, MemoryHistoryRepo, MemorySnapshotRepo,
    WORKSPACE_ID,
};
use domain_snapshot::{
    command::{CaptureCommand, RestoreCommand},
    exception::SnapshotException,
    mock::MockDirectoryService,
    model::{
        entity::HistoryKind,
        vo::{
            Actor, ChannelKind, EntityOperation, GranteeKind, LiveChannel, LiveRole, PermissionMask,
            PermissionOverwrite, RestoreMode, RestoreStage, WorkspaceProfile,
        },
    },
    repository::HistoryRepo,
    service::{CaptureService, RestoreService},
};
use service_snapshot::{CaptureServiceImpl, RestoreServiceImpl};

const SOURCE_ID: &str = "1";

struct Harness {
    snapshots: Arc<MemorySnapshotRepo>,
    history: Arc<MemoryHistoryRepo>,
    capture: CaptureServiceImpl,
    restore: RestoreServiceImpl,
}

fn harness() -> Harness {
    let snapshots = Arc::new(MemorySnapshotRepo::new());
    let history = Arc::new(MemoryHistoryRepo::default());
    Harness {
        capture: CaptureServiceImpl::builder()
            .snapshot_repo(snapshots.clone())
            .history_repo(history.clone())
            .build(),
        restore: RestoreServiceImpl::builder()
            .snapshot_repo(snapshots.clone())
            .history_repo(history.clone())
            .build(),
        snapshots,
        history,
    }
}

fn everyone(id: &str) -> LiveRole {
    LiveRole {
        id: id.into(),
        name: "@everyone".into(),
        is_everyone: true,
        ..Default::default()
    }
}

fn source_workspace(edit: impl FnOnce(&mut DirectoryState)) -> FakeDirectory {
    FakeDirectory::with(|state| {
        state.profile = WorkspaceProfile {
            id: SOURCE_ID.into(),
            name: "Source".into(),
            icon_ref: Some("https://cdn.example/source.png".into()),
        };
        state.roles = vec![everyone(SOURCE_ID)];
        edit(state);
    })
}

fn actor() -> Actor {
    Actor::new("42", "owner#0001")
}

fn restore_cmd(id: &str, mode: RestoreMode, passphrase: Option<&str>) -> RestoreCommand {
    RestoreCommand {
        snapshot_id: id.into(),
        actor: actor(),
        passphrase: passphrase.map(Into::into),
        mode,
    }
}

async fn capture(harness: &Harness, source: &FakeDirectory, passphrase: Option<&str>) -> String {
    harness
        .capture
        .capture(
            source,
            CaptureCommand {
                actor: actor(),
                passphrase: passphrase.map(Into::into),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_restore_of_example_workspace() {
    let harness = harness();
    let source = source_workspace(|state| {
        state.roles.push(role("11", "Admin", 2));
        state.roles.push(role("12", "Member", 1));
        state.channels = vec![
            channel("21", "General", ChannelKind::Category, 0, None),
            channel("22", "chat", ChannelKind::Text, 0, Some("21")),
        ];
        state.members = vec![member("100", "alice#0001", &["11", "12", SOURCE_ID])];
    });
    let id = capture(&harness, &source, Some("secret")).await;

    let destination = FakeDirectory::with(|state| {
        state.members = vec![member("100", "alice#0001", &[])];
    });
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::Full, Some("secret")))
        .await
        .unwrap();

    assert!(outcome.missing_members.is_empty());
    assert_eq!(outcome.failed_attempts(), 0);

    let admin = destination.role_by_name("Admin").unwrap();
    let member_role = destination.role_by_name("Member").unwrap();
    assert!(admin.position > member_role.position);

    let general = destination.channel_by_name("General").unwrap();
    let chat = destination.channel_by_name("chat").unwrap();
    assert_eq!(general.kind, ChannelKind::Category);
    assert_eq!(chat.kind, ChannelKind::Text);
    assert_eq!(chat.parent_id, Some(general.id));

    let mut granted = destination.member("100").unwrap().role_ids;
    granted.sort();
    let mut expected = vec![admin.id, member_role.id];
    expected.sort();
    assert_eq!(granted, expected);

    let state = destination.state.lock().unwrap();
    assert_eq!(state.profile.name, "Source");
    assert_eq!(state.profile.icon_ref.as_deref(), Some("https://cdn.example/source.png"));
    drop(state);

    let history = harness.history.list().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, HistoryKind::Restore);
    assert_eq!(history[0].mode, Some(RestoreMode::Full));
    assert_eq!(history[0].workspace_name, "Source");
    assert_eq!(history[1].kind, HistoryKind::Capture);
    assert_eq!(history[1].is_encrypted, Some(true));
}

#[tokio::test]
async fn test_roles_keep_their_relative_order() {
    let harness = harness();
    let source = source_workspace(|state| {
        for (i, name) in ["R1", "R2", "R3", "R4", "R5"].iter().enumerate() {
            state.roles.push(role(&format!("1{i}"), name, 5 - i as i64));
        }
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.roles.push(role("700", "Stale", 3));
    });
    harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::RolesOnly, None))
        .await
        .unwrap();

    assert!(destination.role_by_name("Stale").is_none());
    let positions: Vec<i64> = ["R1", "R2", "R3", "R4", "R5"]
        .iter()
        .map(|name| destination.role_by_name(name).unwrap().position)
        .collect();
    assert!(positions.windows(2).all(|el| el[0] > el[1]), "{positions:?}");

    let state = destination.state.lock().unwrap();
    let requested: Vec<_> = state.created_roles.iter().map(|el| el.name.as_str()).collect();
    assert_eq!(requested, vec!["R1", "R2", "R3", "R4", "R5"]);
}

#[tokio::test]
async fn test_role_stage_keeps_protected_roles() {
    let harness = harness();
    let source = source_workspace(|state| state.roles.push(role("11", "Admin", 1)));
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.authority = 5;
        state.roles.push(LiveRole {
            managed: true,
            ..role("701", "Integration", 2)
        });
        state.roles.push(role("702", "Above", 6));
        state.roles.push(role("703", "Below", 3));
    });
    harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::RolesOnly, None))
        .await
        .unwrap();

    assert!(destination.role_by_name("@everyone").is_some());
    assert!(destination.role_by_name("Integration").is_some());
    assert!(destination.role_by_name("Above").is_some());
    assert!(destination.role_by_name("Below").is_none());
    assert!(destination.role_by_name("Admin").is_some());
}

#[tokio::test]
async fn test_single_role_failure_is_contained() {
    let harness = harness();
    let source = source_workspace(|state| {
        for (i, name) in ["R1", "R2", "R3", "R4", "R5"].iter().enumerate() {
            state.roles.push(role(&format!("1{i}"), name, 5 - i as i64));
        }
        state.members = vec![
            member("100", "only-r3", &["12"]),
            member("101", "r3-and-r4", &["12", "13"]),
        ];
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.members = vec![member("100", "only-r3", &[]), member("101", "r3-and-r4", &[])];
    });
    destination.fail_on("R3");
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::Full, None))
        .await
        .unwrap();

    for name in ["R1", "R2", "R4", "R5"] {
        assert!(destination.role_by_name(name).is_some(), "{name} missing");
    }
    assert!(destination.role_by_name("R3").is_none());

    let roles = outcome.stage(RestoreStage::Roles).unwrap();
    assert_eq!(roles.succeeded(EntityOperation::CreateRole), 4);
    let failures: Vec<_> = roles.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].operation, EntityOperation::CreateRole);
    assert_eq!(failures[0].target, "R3");

    assert!(destination.member("100").unwrap().role_ids.is_empty());
    let r4 = destination.role_by_name("R4").unwrap();
    assert_eq!(destination.member("101").unwrap().role_ids, vec![r4.id]);
}

#[tokio::test]
async fn test_children_of_failed_category_have_no_parent() {
    let harness = harness();
    let source = source_workspace(|state| {
        state.channels = vec![
            channel("21", "Text Channels", ChannelKind::Category, 0, None),
            channel("22", "Voice Channels", ChannelKind::Category, 1, None),
            channel("23", "general", ChannelKind::Text, 0, Some("21")),
            LiveChannel {
                bitrate: Some(96000),
                user_limit: Some(8),
                nsfw: true,
                topic: Some("after hours".into()),
                ..channel("24", "lounge", ChannelKind::Voice, 1, Some("22"))
            },
            channel("25", "orphan", ChannelKind::Text, 2, Some("404")),
        ];
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.channels = vec![channel("800", "old", ChannelKind::Text, 0, None)];
    });
    destination.fail_on("Voice Channels");
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::ChannelsOnly, None))
        .await
        .unwrap();

    assert!(destination.channel_by_name("old").is_none());
    let text_category = destination.channel_by_name("Text Channels").unwrap();
    let general = destination.channel_by_name("general").unwrap();
    assert_eq!(general.parent_id, Some(text_category.id));

    let lounge = destination.channel_by_name("lounge").unwrap();
    assert_eq!(lounge.parent_id, None);
    assert_eq!(lounge.bitrate, Some(96000));
    assert_eq!(lounge.user_limit, Some(8));
    assert!(lounge.nsfw);
    assert_eq!(lounge.topic.as_deref(), Some("after hours"));
    assert_eq!(destination.channel_by_name("orphan").unwrap().parent_id, None);

    let channels = outcome.stage(RestoreStage::Channels).unwrap();
    assert_eq!(channels.succeeded(EntityOperation::CreateChannel), 3);
    assert_eq!(channels.failures().count(), 1);
    assert!(outcome.stage(RestoreStage::Roles).is_none());
}

#[tokio::test]
async fn test_overwrites_follow_recreated_roles() {
    let harness = harness();
    let overwrite = |grantee: &str, kind| PermissionOverwrite {
        grantee_id: grantee.into(),
        grantee_kind: kind,
        allow_mask: PermissionMask(1024),
        deny_mask: PermissionMask(2048),
    };
    let source = source_workspace(|state| {
        state.roles.push(role("11", "Mod", 1));
        state.channels = vec![LiveChannel {
            overwrites: vec![
                overwrite(SOURCE_ID, GranteeKind::Role),
                overwrite("11", GranteeKind::Role),
                overwrite("100", GranteeKind::Member),
            ],
            ..channel("21", "staff", ChannelKind::Text, 0, None)
        }];
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::empty();
    harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::Full, None))
        .await
        .unwrap();

    let moderator = destination.role_by_name("Mod").unwrap();
    let staff = destination.channel_by_name("staff").unwrap();
    let grantees: Vec<_> = staff.overwrites.iter().map(|el| el.grantee_id.as_str()).collect();
    assert_eq!(grantees, vec![WORKSPACE_ID, moderator.id.as_str(), "100"]);
    assert!(staff
        .overwrites
        .iter()
        .all(|el| el.allow_mask.bits() == 1024 && el.deny_mask.bits() == 2048));
}

#[tokio::test]
async fn test_missing_members_are_reported() {
    let harness = harness();
    let source = source_workspace(|state| {
        state.roles.push(role("11", "Member", 1));
        state.members = vec![
            member("100", "alice#0001", &["11"]),
            member("101", "bob#0002", &["11"]),
            member("102", "carol#0003", &["11"]),
        ];
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.members = vec![member("100", "alice#0001", &[]), member("102", "carol#0003", &[])];
    });
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::RolesOnly, None))
        .await
        .unwrap();

    assert_eq!(outcome.missing_members, vec!["bob#0002".to_string()]);
    assert_eq!(outcome.failed_attempts(), 0);
}

#[tokio::test]
async fn test_member_fetch_failure_is_recorded() {
    let harness = harness();
    let source = source_workspace(|state| {
        state.roles.push(role("11", "Member", 1));
        state.members = vec![member("100", "alice#0001", &["11"])];
    });
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| state.fail_members = true);
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::RolesOnly, None))
        .await
        .unwrap();

    assert!(destination.role_by_name("Member").is_some());
    assert!(outcome.missing_members.is_empty());
    let failures: Vec<_> = outcome.stage(RestoreStage::Roles).unwrap().failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].operation, EntityOperation::FetchMembers);
}

#[tokio::test]
async fn test_basic_mode_only_sets_identity() {
    let harness = harness();
    let source = source_workspace(|state| state.roles.push(role("11", "Admin", 1)));
    let id = capture(&harness, &source, None).await;

    let destination = FakeDirectory::with(|state| {
        state.channels = vec![channel("800", "keep-me", ChannelKind::Text, 0, None)];
    });
    let outcome = harness
        .restore
        .restore(&destination, restore_cmd(&id, RestoreMode::Basic, None))
        .await
        .unwrap();

    assert_eq!(outcome.stages.len(), 1);
    assert_eq!(outcome.stages[0].stage, RestoreStage::Identity);
    assert!(destination.channel_by_name("keep-me").is_some());
    assert!(destination.role_by_name("Admin").is_none());
    assert_eq!(destination.state.lock().unwrap().profile.name, "Source");
}

fn untouched_directory() -> MockDirectoryService {
    let mut directory = MockDirectoryService::new();
    directory.expect_profile().never();
    directory.expect_set_identity().never();
    directory.expect_roles().never();
    directory.expect_delete_role().never();
    directory.expect_create_role().never();
    directory.expect_channels().never();
    directory.expect_delete_channel().never();
    directory.expect_create_channel().never();
    directory.expect_grant_roles().never();
    directory
}

#[tokio::test]
async fn test_pre_flight_failures_leave_workspace_untouched() {
    let harness = harness();
    let source = source_workspace(|state| state.roles.push(role("11", "Admin", 1)));
    let id = capture(&harness, &source, Some("secret")).await;
    let directory = untouched_directory();

    let missing = harness
        .restore
        .restore(&directory, restore_cmd("nope", RestoreMode::Full, None))
        .await;
    assert!(matches!(missing, Err(SnapshotException::NotFound { .. })));

    let no_password = harness
        .restore
        .restore(&directory, restore_cmd(&id, RestoreMode::Full, None))
        .await;
    assert!(matches!(no_password, Err(SnapshotException::PasswordRequired)));

    let wrong_password = harness
        .restore
        .restore(&directory, restore_cmd(&id, RestoreMode::Full, Some("guess")))
        .await;
    assert!(matches!(wrong_password, Err(SnapshotException::WrongPassword)));

    harness.snapshots.put_raw("broken", b"not json, not base64!");
    let corrupt = harness
        .restore
        .restore(&directory, restore_cmd("broken", RestoreMode::Full, Some("secret")))
        .await;
    assert!(matches!(corrupt, Err(SnapshotException::Corrupt { .. })));

    // Only the capture was recorded.
    assert_eq!(harness.history.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_destination_fails_restore() {
    let harness = harness();
    let source = source_workspace(|_| {});
    let id = capture(&harness, &source, None).await;

    let mut directory = MockDirectoryService::new();
    directory
        .expect_profile()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("gateway timeout")));
    directory.expect_set_identity().never();

    let result = harness
        .restore
        .restore(&directory, restore_cmd(&id, RestoreMode::Full, None))
        .await;
    assert!(matches!(result, Err(SnapshotException::RestoreFailed { .. })));
}

#[tokio::test]
async fn test_unreadable_store_fails_restore_before_touching_workspace() {
    let harness = harness();
    let source = source_workspace(|state| state.roles.push(role("11", "Admin", 1)));
    let id = capture(&harness, &source, None).await;
    harness.snapshots.fail_reads("permission denied");

    let result = harness
        .restore
        .restore(&untouched_directory(), restore_cmd(&id, RestoreMode::Full, None))
        .await;
    match result {
        Err(SnapshotException::RestoreFailed { source }) => {
            assert!(source.to_string().contains("permission denied"))
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(harness.history.list().await.unwrap().len(), 1);
}
