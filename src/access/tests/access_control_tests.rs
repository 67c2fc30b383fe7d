//! Integration tests for the AccessControl facade
//!
//! Grant chains → inheritance → permission resolution → data filtering,
//! plus lock behaviour and bulk loading.

use cretoai_access::{
    control::{AccessControl, AccessControlConfig},
    error::AccessError,
    types::{AccessInfo, Action, Possession, QueryInfo},
    Grants, GrantsInput,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Video platform model used by several tests
fn video_platform() -> AccessControl {
    let mut ac = AccessControl::new();
    ac.grant("user")
        .unwrap()
        .attributes(["*", "!views"])
        .read_any("video")
        .unwrap()
        .attributes(["title", "description"])
        .update_own("video")
        .unwrap()
        .create_own("video")
        .unwrap()
        .grant("moderator")
        .unwrap()
        .extend("user")
        .unwrap()
        .update_any("video")
        .unwrap()
        .grant("admin")
        .unwrap()
        .extend("moderator")
        .unwrap()
        .delete_any("video")
        .unwrap();
    ac
}

// ============================================================================
// BASIC GRANT / DENY FLOW
// ============================================================================

#[test]
fn test_grant_then_deny_scenario() {
    init_tracing();
    let mut ac = AccessControl::new();

    ac.grant("admin").unwrap().create_any("profile").unwrap();
    let permission = ac.can("admin").create_any("profile").unwrap();
    assert!(permission.granted());
    assert_eq!(permission.attributes(), &["*"]);

    ac.deny("admin").unwrap().create_any("profile").unwrap();
    let permission = ac.can("admin").create_any("profile").unwrap();
    assert!(!permission.granted());
    assert!(permission.attributes().is_empty());
}

#[test]
fn test_denial_clears_attributes() {
    let mut ac = video_platform();
    ac.deny("user").unwrap().read_any("video").unwrap();

    let permission = ac.can("user").read_any("video").unwrap();
    assert!(!permission.granted());
    assert!(permission.attributes().is_empty());
}

#[test]
fn test_grant_alone_creates_role() {
    let mut ac = AccessControl::new();
    ac.grant("viewer").unwrap();
    assert!(ac.has_role("viewer"));
    assert!(!ac.has_resource("video"));
}

#[test]
fn test_multiple_roles_and_resources_per_call() {
    let mut ac = AccessControl::new();
    ac.grant("editor, writer")
        .unwrap()
        .update_any(["post", "page"])
        .unwrap();

    for role in ["editor", "writer"] {
        for resource in ["post", "page"] {
            assert!(ac.can(role).update_any(resource).unwrap().granted());
        }
    }
    assert_eq!(ac.get_resources(), vec!["page", "post"]);
}

#[test]
fn test_grant_info_commits_record() {
    let mut ac = AccessControl::new();
    let info = AccessInfo::new("user", "comment", "create")
        .with_possession("own")
        .with_attributes("text; tags");
    ac.grant_info(info).unwrap();

    let permission = ac.can("user").create_own("comment").unwrap();
    assert_eq!(permission.attributes(), &["text", "tags"]);
    assert!(!ac.can("user").create_any("comment").unwrap().granted());

    ac.deny_info(AccessInfo::new("user", "comment", "create:own")).unwrap();
    assert!(!ac.can("user").create_own("comment").unwrap().granted());
}

// ============================================================================
// POSSESSION FALLBACK
// ============================================================================

#[test]
fn test_any_grant_satisfies_own_query() {
    let ac = video_platform();
    let own = ac.can("user").read_own("video").unwrap();
    let any = ac.can("user").read_any("video").unwrap();
    assert!(own.granted());
    assert_eq!(own.attributes(), any.attributes());
}

#[test]
fn test_own_grant_does_not_satisfy_any_query() {
    let ac = video_platform();
    assert!(ac.can("user").update_own("video").unwrap().granted());
    assert!(!ac.can("user").update_any("video").unwrap().granted());
}

// ============================================================================
// INHERITANCE
// ============================================================================

#[test]
fn test_inherited_permissions() {
    let ac = video_platform();
    let admin = ac.can("admin");
    assert!(admin.delete_any("video").unwrap().granted());
    assert!(admin.update_any("video").unwrap().granted());
    // moderator's update:any covers the narrower update:own of user
    assert_eq!(admin.update_own("video").unwrap().attributes(), &["*"]);
    assert_eq!(
        ac.can("user").update_own("video").unwrap().attributes(),
        &["title", "description"]
    );

    assert_eq!(
        ac.get_inherited_roles_of("admin").unwrap(),
        vec!["moderator", "user"]
    );
    assert!(matches!(
        ac.get_inherited_roles_of("ghost"),
        Err(AccessError::RoleNotFound(_))
    ));
}

#[test]
fn test_cycle_rejected_and_store_unchanged() {
    let mut ac = AccessControl::new();
    ac.extend_role("a", "b").unwrap_err();
    ac.grant("b").unwrap();
    ac.extend_role("a", "b").unwrap();

    let before = ac.get_grants().clone();
    let err = ac.extend_role("b", "a").unwrap_err();
    assert!(matches!(
        err,
        AccessError::CrossInheritance { ref role, ref extender } if role == "b" && extender == "a"
    ));
    assert_eq!(ac.get_grants(), &before);

    assert!(matches!(
        ac.extend_role("a", "a"),
        Err(AccessError::SelfExtension(_))
    ));
}

#[test]
fn test_remove_roles_prunes_inheritance() {
    let mut ac = AccessControl::new();
    ac.grant("b").unwrap().read_any("doc").unwrap();
    ac.grant("a").unwrap().extend("b").unwrap();
    assert!(ac.can("a").read_any("doc").unwrap().granted());

    ac.remove_roles("b").unwrap();
    assert!(!ac.has_role("b"));
    assert!(ac.get_inherited_roles_of("a").unwrap().is_empty());
    assert!(!ac.can("a").read_any("doc").unwrap().granted());

    assert!(matches!(
        ac.remove_roles("b"),
        Err(AccessError::RoleNotFound(_))
    ));
}

#[test]
fn test_remove_resources() {
    let mut ac = video_platform();
    ac.grant("user").unwrap().read_any("photo").unwrap();

    ac.remove_resources("video", Some(vec!["admin".to_string()])).unwrap();
    assert!(!ac.can("admin").delete_any("video").unwrap().granted());
    assert!(ac.can("admin").update_any("video").unwrap().granted());

    ac.remove_resources("video", None).unwrap();
    assert!(!ac.has_resource("video"));
    assert!(ac.has_resource("photo"));
}

// ============================================================================
// ATTRIBUTE UNION AND FILTERING
// ============================================================================

#[test]
fn test_union_restores_negated_attribute() {
    let mut ac = AccessControl::new();
    ac.grant("x")
        .unwrap()
        .attributes(["*", "!secret"])
        .read_any("r")
        .unwrap()
        .grant("y")
        .unwrap()
        .attributes(["secret"])
        .read_any("r")
        .unwrap();

    let permission = ac.can(["x", "y"]).read_any("r").unwrap();
    assert_eq!(permission.attributes(), &["*"]);

    let data = json!({ "id": 1, "secret": "s" });
    assert_eq!(permission.filter(&data).unwrap(), data);
    assert_eq!(
        ac.can("x").read_any("r").unwrap().filter(&data).unwrap(),
        json!({ "id": 1 })
    );
}

#[test]
fn test_filter_scenario() {
    let filtered = AccessControl::filter(
        &json!({ "id": 1, "password": "x", "name": "n" }),
        &["*", "!password"],
    )
    .unwrap();
    assert_eq!(filtered, json!({ "id": 1, "name": "n" }));
}

#[test]
fn test_nested_attributes() {
    let mut ac = AccessControl::new();
    ac.grant("user")
        .unwrap()
        .attributes(["*", "!account.balance", "account.balance.currency"])
        .read_own("wallet")
        .unwrap();

    let permission = ac.can("user").read_own("wallet").unwrap();
    let data = json!({
        "id": 1,
        "account": { "number": "42", "balance": { "amount": 10, "currency": "EUR" } }
    });
    assert_eq!(
        permission.filter(&data).unwrap(),
        json!({ "id": 1, "account": { "number": "42", "balance": { "currency": "EUR" } } })
    );
}

#[test]
fn test_filter_array_of_objects() {
    let ac = video_platform();
    let permission = ac.can("user").read_any("video").unwrap();
    let videos = json!([
        { "id": 1, "title": "a", "views": 10 },
        { "id": 2, "title": "b", "views": 20 }
    ]);
    assert_eq!(
        permission.filter(&videos).unwrap(),
        json!([{ "id": 1, "title": "a" }, { "id": 2, "title": "b" }])
    );
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_permission_from_query_info() {
    let ac = video_platform();
    let info = QueryInfo::new("moderator", "video", "update").with_possession("any");
    let permission = ac.permission(&info).unwrap();
    assert!(permission.granted());
    assert_eq!(permission.roles(), &["moderator"]);
    assert_eq!(permission.resource(), "video");

    let info = QueryInfo::new("moderator", "video", "fly");
    assert!(matches!(ac.permission(&info), Err(AccessError::InvalidAction(_))));
    let info = QueryInfo::new("moderator", "video", "read").with_possession("mine");
    assert!(matches!(ac.permission(&info), Err(AccessError::InvalidPossession(_))));
    let info = QueryInfo::new("moderator", "  ", "read");
    assert!(matches!(ac.permission(&info), Err(AccessError::InvalidName(_))));
}

#[test]
fn test_query_info_builder() {
    let ac = video_platform();
    let query = ac
        .can_info(QueryInfo {
            role: vec!["user".to_string()],
            resource: Some("video".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(query.execute(Action::Create, Possession::Own).unwrap().granted());
    assert!(!query.execute(Action::Delete, Possession::Any).unwrap().granted());

    assert!(matches!(
        ac.can_info(QueryInfo::default()),
        Err(AccessError::InvalidShape(_))
    ));
}

// ============================================================================
// LOCKING
// ============================================================================

#[test]
fn test_lock_is_idempotent() {
    let mut ac = video_platform();
    ac.lock().unwrap();
    let first = ac.grant("guest").unwrap_err();
    ac.lock().unwrap();
    let second = ac.grant("guest").unwrap_err();

    assert!(first.is_locked() && second.is_locked());
    assert!(ac.is_locked());
    assert!(ac.reset().unwrap_err().is_locked());
    assert!(ac.remove_roles("user").unwrap_err().is_locked());
    assert!(ac.remove_resources("video", None).unwrap_err().is_locked());
    assert!(ac.extend_role("user", "admin").unwrap_err().is_locked());
    assert!(ac.set_grants(Grants::new()).unwrap_err().is_locked());
    assert!(ac.deny("user").unwrap_err().is_locked());

    // Reads keep working
    assert!(ac.can("admin").delete_any("video").unwrap().granted());
}

#[test]
fn test_lock_empty_model_fails() {
    let mut ac = AccessControl::new();
    assert!(matches!(ac.lock(), Err(AccessError::EmptyGrants)));
    assert!(!ac.is_locked());
}

// ============================================================================
// BULK LOADING
// ============================================================================

#[test]
fn test_round_trip_through_json() {
    let ac = video_platform();
    let value = ac.grants_json().unwrap();

    let copy = AccessControl::with_grants(GrantsInput::from_json(value).unwrap()).unwrap();
    assert_eq!(copy.get_grants(), ac.get_grants());
    assert_eq!(
        copy.can("admin").update_own("video").unwrap(),
        ac.can("admin").update_own("video").unwrap()
    );
}

#[test]
fn test_flat_records_match_mapping() {
    let mapping = GrantsInput::from_json(json!({
        "user": { "video": { "read:any": ["*", "!views"], "update:own": ["title"] } },
        "admin": { "video": { "delete:any": ["*"] }, "$extend": ["user"] }
    }))
    .unwrap();
    let records = GrantsInput::from_json(json!([
        { "role": "user", "resource": "video", "action": "read:any", "attributes": ["*", "!views"] },
        { "subject": "user", "resource": "video", "action": "update", "possession": "own", "attributes": "title" },
        { "role": "admin", "resource": "video", "action": "delete:any" }
    ]))
    .unwrap();

    let from_mapping = AccessControl::with_grants(mapping).unwrap();
    let mut from_records = AccessControl::with_grants(records).unwrap();
    from_records.extend_role("admin", "user").unwrap();

    assert_eq!(from_mapping.get_grants(), from_records.get_grants());
    for role in ["user", "admin"] {
        for action in Action::ALL {
            for possession in [Possession::Own, Possession::Any] {
                let a = from_mapping.can(role).resource("video").execute(action, possession).unwrap();
                let b = from_records.can(role).resource("video").execute(action, possession).unwrap();
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn test_padded_names_in_mapping_are_trimmed() {
    let mapping = GrantsInput::from_json(json!({
        " user ": { " video ": { "read:any": ["*"] }, "$extend": [" guest "] },
        "guest": { "photo": { "read:any": ["*"] } }
    }))
    .unwrap();
    let records = GrantsInput::from_json(json!([
        { "role": " user ", "resource": " video ", "action": "read:any" },
        { "role": "guest", "resource": "photo", "action": "read:any" }
    ]))
    .unwrap();

    let from_mapping = AccessControl::with_grants(mapping).unwrap();
    let mut from_records = AccessControl::with_grants(records).unwrap();
    from_records.extend_role("user", "guest").unwrap();

    assert_eq!(from_mapping.get_grants(), from_records.get_grants());
    assert_eq!(from_mapping.get_resources(), vec!["photo", "video"]);
    assert!(from_mapping.can("user").read_any("video").unwrap().granted());
    assert!(from_mapping.can("user").read_any("photo").unwrap().granted());

    // Reserved names stay reserved with surrounding whitespace
    for input in [
        json!({ "user": { " * ": { "read:any": ["*"] } } }),
        json!({ " $ ": { "video": { "read:any": ["*"] } } }),
    ] {
        assert!(matches!(
            GrantsInput::from_json(input),
            Err(AccessError::InvalidName(_))
        ));
    }

    // A model built in code must already carry clean names
    let mut grants = Grants::new();
    grants.insert(" user ".to_string(), Default::default());
    assert!(matches!(
        AccessControl::with_grants(grants),
        Err(AccessError::InvalidName(_))
    ));
}

#[test]
fn test_invalid_bulk_input() {
    assert!(matches!(
        GrantsInput::from_json(json!(42)),
        Err(AccessError::InvalidShape(_))
    ));

    // Extending an unknown role fails the whole load
    let input = GrantsInput::from_json(json!({ "user": { "$extend": ["ghost"] } })).unwrap();
    assert!(matches!(
        AccessControl::with_grants(input),
        Err(AccessError::RoleNotFound(_))
    ));

    let mut ac = video_platform();
    let before = ac.get_grants().clone();
    let input = GrantsInput::from_json(json!([{ "role": "user", "resource": "video" }])).unwrap();
    assert!(matches!(ac.set_grants(input), Err(AccessError::InvalidAction(_))));
    assert_eq!(ac.get_grants(), &before);
}

#[test]
fn test_config_without_trace() {
    let config = AccessControlConfig {
        trace_decisions: false,
        ..Default::default()
    };
    let ac = AccessControl::with_config(Grants::new(), config).unwrap();
    assert!(!ac.config().trace_decisions);
    assert!(ac.get_roles().is_empty());
}
