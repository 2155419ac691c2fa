use super::*;
use crate::aggregator::{aggregate, RepositoryChange, Verdict};
use crate::normalizer::{normalize_desired, normalize_observed};
use crate::state::{GrantedRole, IdentityKey, NormalizedRepository, Setting};
use crate::test_support::{desired_spec, observed_repository, FixtureConfig};
use config_manager::Role;

fn normalized() -> (NormalizedRepository, NormalizedRepository) {
    let config = FixtureConfig::default();
    let desired = normalize_desired(&desired_spec(&config)).expect("Failed to normalize");
    let observed = normalize_observed(&observed_repository(&config));
    (desired, observed)
}

fn plan_for(desired: &NormalizedRepository, observed: &NormalizedRepository) -> Plan {
    match aggregate(desired, observed) {
        Verdict::NotUpToDate(changes) => build_plan(&changes),
        other => panic!("Expected drift, got {other:?}"),
    }
}

fn descriptions(plan: &Plan) -> Vec<String> {
    plan.operations.iter().map(ToString::to_string).collect()
}

#[test]
fn test_empty_change_set_gives_empty_plan() {
    let plan = build_plan(&ChangeSet::default());

    assert!(plan.is_empty());
    assert!(plan.pending.is_empty());
}

#[test]
fn test_creates_come_before_updates_and_deletes() {
    let (mut desired, mut observed) = normalized();
    desired.users.push(PermissionEntry::new("newcomer", Role::Triage));
    desired.users[0].role = GrantedRole::Base(Role::Maintain);
    observed
        .users
        .push(PermissionEntry::new("leaver", Role::Push));

    let plan = plan_for(&desired, &observed);

    assert_eq!(
        descriptions(&plan),
        vec![
            "grant triage to user newcomer",
            "change role of user TEST-USER-1 to maintain",
            "remove user leaver",
        ]
    );
}

#[test]
fn test_categories_follow_comparison_order() {
    let (mut desired, mut observed) = normalized();
    desired.rulesets[0].enforcement = Setting::Explicit(github_client::RulesetEnforcement::Evaluate);
    desired.branch_protections[0].lock_branch = Setting::Explicit(true);
    observed.webhooks.clear();
    desired.teams[1].role = GrantedRole::Base(Role::Admin);
    desired.users[1].role = GrantedRole::Base(Role::Push);
    desired.fields.private = Setting::Explicit(false);

    let plan = plan_for(&desired, &observed);

    assert_eq!(
        descriptions(&plan),
        vec![
            "edit repository (private)",
            "change role of user TEST-USER-2 to push",
            "change role of team TEST-TEAM-2 to admin",
            "create webhook https://example.org/webhook",
            "update protection of branch main (lock_branch)",
            "update ruleset 123 test-ruleset-1 (enforcement)",
        ]
    );
}

#[test]
fn test_archiving_edit_comes_last() {
    let (mut desired, observed) = normalized();
    desired.fields.archived = Setting::Explicit(true);
    desired.teams[0].role = GrantedRole::Base(Role::Push);

    let plan = plan_for(&desired, &observed);

    assert!(matches!(
        plan.operations.first(),
        Some(Operation::UpdateTeam(_))
    ));
    assert!(matches!(
        plan.operations.last(),
        Some(Operation::EditRepository { .. })
    ));
}

#[test]
fn test_unarchiving_edit_comes_first() {
    let (mut desired, mut observed) = normalized();
    observed.fields.archived = Setting::Explicit(true);
    desired.teams[0].role = GrantedRole::Base(Role::Push);

    let plan = plan_for(&desired, &observed);

    assert_eq!(descriptions(&plan)[0], "edit repository (archived)");
}

#[test]
fn test_protection_of_missing_branch_is_pending() {
    let (mut desired, mut observed) = normalized();
    observed.branch_protections.clear();
    observed.existing_branches.clear();
    desired
        .branch_protections
        .push(NormalizedBranchProtection::unmanaged("release"));
    observed.existing_branches.insert(IdentityKey::new("RELEASE"));

    let plan = plan_for(&desired, &observed);

    assert_eq!(descriptions(&plan), vec!["protect branch release"]);
    assert_eq!(
        plan.pending,
        vec![Pending::BranchMissing {
            branch: "main".to_string()
        }]
    );
}

#[test]
fn test_ruleset_without_id_is_created() {
    let (mut desired, mut observed) = normalized();
    observed.rulesets[0].id = None;
    desired.rulesets[0].rules.creation = Setting::Explicit(false);

    let plan = plan_for(&desired, &observed);

    assert_eq!(descriptions(&plan), vec!["create ruleset test-ruleset-1"]);
}

#[test]
fn test_observed_only_entries_are_removed() {
    let (desired, mut observed) = normalized();
    let mut extra = observed.webhooks[0].clone();
    extra.key = IdentityKey::new("https://old.example.org/hook");
    extra.url = "https://old.example.org/hook".to_string();
    extra.id = Some(9);
    observed.webhooks.push(extra);
    let mut ruleset = observed.rulesets[0].clone();
    ruleset.key = IdentityKey::new("legacy");
    ruleset.name = "legacy".to_string();
    ruleset.id = Some(77);
    observed.rulesets.push(ruleset);
    observed
        .branch_protections
        .push(NormalizedBranchProtection::unmanaged("develop"));

    let plan = plan_for(&desired, &observed);

    assert_eq!(
        descriptions(&plan),
        vec![
            "delete webhook 9 https://old.example.org/hook",
            "remove protection of branch develop",
            "delete ruleset 77 legacy",
        ]
    );
}

#[test]
fn test_edit_carries_only_changed_fields() {
    let changes = ChangeSet {
        repository: Some(RepositoryChange {
            fields: crate::state::RepositoryFields {
                description: Setting::Explicit("new".to_string()),
                ..Default::default()
            },
            changed: ["description"].into_iter().collect(),
        }),
        ..Default::default()
    };

    let plan = build_plan(&changes);

    match &plan.operations[..] {
        [Operation::EditRepository { fields, changed }] => {
            assert_eq!(fields.description, Setting::Explicit("new".to_string()));
            assert_eq!(fields.private, Setting::Unset);
            assert!(changed.contains("description"));
        }
        other => panic!("Expected a single edit, got {other:?}"),
    }
}

#[test]
fn test_pending_description() {
    let pending = Pending::BranchMissing {
        branch: "main".to_string(),
    };

    assert_eq!(
        pending.to_string(),
        "protection of branch main waits for the branch to exist"
    );
}
