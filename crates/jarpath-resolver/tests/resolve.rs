mod support;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use jarpath_core::artifact::BuildArtifact;
use jarpath_core::config::ResolveConfig;
use jarpath_core::dependency::{DependencyEdge, Exclusion};
use jarpath_core::scope::Scope;
use jarpath_resolver::context::{Collaborators, ResolutionContext};
use jarpath_util::errors::JarpathError;
use tokio_util::sync::CancellationToken;

use support::*;

#[tokio::test]
async fn nearest_declaration_wins() {
    let repo = FakeRepository::new()
        .leaf("g:a:1")
        .leaf("g:a:2")
        .with("g:b:1", &[("g:a:2", Scope::Compile)]);
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile), declare("g:b:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap();

    assert_eq!(
        resolution.notations(),
        ["g:a:jar:1", "g:b:jar:1"]
    );
    assert_eq!(resolution.conflicts.len(), 1);
}

#[tokio::test]
async fn first_declared_path_wins_at_equal_depth() {
    // The later-declared path answers first; declaration order still decides.
    let repo = FakeRepository::new()
        .with("g:x:1", &[("g:a:1", Scope::Compile)])
        .with("g:y:1", &[("g:a:2", Scope::Compile)])
        .leaf("g:a:1")
        .leaf("g:a:2")
        .delay("g:x:1", 40);
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:x:1", Scope::Compile), declare("g:y:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap();

    assert!(resolution.notations().contains(&"g:a:jar:1".to_string()));
    assert!(!resolution.notations().contains(&"g:a:jar:2".to_string()));
}

#[tokio::test]
async fn result_is_independent_of_fetch_timing() {
    let build = |delays: &[(&str, u64)]| {
        let mut repo = FakeRepository::new()
            .with("g:a:1", &[("g:c:1", Scope::Compile), ("g:d:1", Scope::Runtime)])
            .with("g:b:1", &[("g:d:2", Scope::Compile), ("g:e:1", Scope::Compile)])
            .with("g:c:1", &[("g:e:2", Scope::Compile)])
            .with("g:d:1", &[("g:f:1", Scope::Compile)])
            .leaf("g:d:2")
            .leaf("g:e:1")
            .leaf("g:e:2")
            .leaf("g:f:1");
        for (notation, millis) in delays {
            repo = repo.delay(notation, *millis);
        }
        Arc::new(repo)
    };
    let roots = || vec![declare("g:a:1", Scope::Compile), declare("g:b:1", Scope::Compile)];

    let first = resolve_with(build(&[("g:a:1", 30), ("g:c:1", 20)]), roots(), offline_config())
        .await
        .unwrap();
    let second = resolve_with(build(&[("g:b:1", 30), ("g:d:1", 20)]), roots(), offline_config())
        .await
        .unwrap();

    assert_eq!(first.resolved, second.resolved);
    assert_eq!(
        summary(&first),
        [
            "g:a:jar:1 (compile)",
            "g:b:jar:1 (compile)",
            "g:c:jar:1 (compile)",
            "g:d:jar:1 (compile)",
            "g:e:jar:1 (compile)",
            "g:f:jar:1 (runtime)",
        ]
    );
}

#[tokio::test]
async fn build_artifact_overrides_resolved_version() {
    let repo = FakeRepository::new()
        .with("g:app:1", &[("g:x:2.0", Scope::Compile)])
        .leaf("g:x:2.0");
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:app:1", Scope::Compile));
    ctx.add_build_artifact(BuildArtifact::new(
        coord("g:x:1.0"),
        "/build/x-1.0.jar",
        None,
    ));

    let resolution = ctx
        .resolve(&Collaborators::new(Arc::new(repo)), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.notations(), ["g:app:jar:1", "g:x:jar:1.0"]);
    assert_eq!(resolution.classpath(), [PathBuf::from("/build/x-1.0.jar")]);
}

#[tokio::test]
async fn build_artifact_without_descriptor_is_not_queried() {
    let repo = Arc::new(FakeRepository::new());
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:local:1", Scope::Compile));
    ctx.add_build_artifact(BuildArtifact::new(coord("g:local:1"), "/out/local.jar", None));

    let resolution = ctx
        .resolve(&Collaborators::new(repo.clone()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(repo.fetch_count(), 0);
    assert_eq!(resolution.classpath_string(), "/out/local.jar");
}

#[tokio::test]
async fn build_artifact_descriptor_supplies_dependencies() {
    let repo = Arc::new(FakeRepository::new().leaf("g:lib:3"));
    let descriptors = FakeDescriptors::default().with("/out/local.pom", &[("g:lib:3", Scope::Compile)]);
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:local:1", Scope::Compile));
    ctx.add_build_artifact(BuildArtifact::new(
        coord("g:local:1"),
        "/out/local.jar",
        Some(PathBuf::from("/out/local.pom")),
    ));

    let collaborators =
        Collaborators::new(repo.clone()).with_descriptor_reader(Arc::new(descriptors));
    let resolution = ctx
        .resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(repo.fetched("g:local:1"), 0);
    assert_eq!(resolution.notations(), ["g:local:jar:1", "g:lib:jar:3"]);
}

#[tokio::test]
async fn test_and_provided_dependencies_stay_in_their_subtree() {
    let repo = FakeRepository::new()
        .with(
            "g:a:1",
            &[
                ("g:junit:4", Scope::Test),
                ("g:servlet:3", Scope::Provided),
                ("g:rt:1", Scope::Runtime),
            ],
        )
        .leaf("g:rt:1");
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary(&resolution),
        ["g:a:jar:1 (compile)", "g:rt:jar:1 (runtime)"]
    );
}

#[tokio::test]
async fn test_scoped_root_carries_test_scope_down() {
    let repo = FakeRepository::new()
        .with("g:junit:4", &[("g:hamcrest:1", Scope::Compile)])
        .leaf("g:hamcrest:1");
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:junit:4", Scope::Test)],
        offline_config(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary(&resolution),
        ["g:junit:jar:4 (test)", "g:hamcrest:jar:1 (test)"]
    );
}

#[tokio::test]
async fn system_scoped_root_is_a_leaf() {
    let repo = Arc::new(FakeRepository::new().with("g:tools:1", &[("g:x:1", Scope::Compile)]));
    let resolution = resolve_with(
        repo.clone(),
        vec![declare("g:tools:1", Scope::System)],
        offline_config(),
    )
    .await
    .unwrap();

    assert_eq!(repo.fetch_count(), 0);
    assert_eq!(resolution.notations(), ["g:tools:jar:1"]);
}

#[tokio::test]
async fn cycle_fails_under_strict_acyclic() {
    let repo = FakeRepository::new()
        .with("g:a:1", &[("g:b:1", Scope::Compile)])
        .with("g:b:1", &[("g:a:1", Scope::Compile)]);
    let config = ResolveConfig {
        strict_acyclic: true,
        ..offline_config()
    };
    let err = resolve_with(Arc::new(repo), vec![declare("g:a:1", Scope::Compile)], config)
        .await
        .unwrap_err();

    match err {
        JarpathError::CyclicDependency { path } => {
            assert_eq!(path, ["g:a:jar:1", "g:b:jar:1", "g:a:jar:1"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn cycle_is_cut_by_default() {
    let repo = FakeRepository::new()
        .with("g:a:1", &[("g:b:1", Scope::Compile)])
        .with("g:b:1", &[("g:a:2", Scope::Compile)]);
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap();

    assert_eq!(resolution.notations(), ["g:a:jar:1", "g:b:jar:1"]);
    assert_eq!(resolution.cycles.len(), 1);
    assert_eq!(resolution.graph.len(), 2);
}

#[tokio::test]
async fn empty_input_resolves_to_nothing() {
    let resolution = resolve_with(Arc::new(FakeRepository::new()), Vec::new(), offline_config())
        .await
        .unwrap();
    assert!(resolution.resolved.is_empty());
    assert!(resolution.classpath().is_empty());
    assert_eq!(resolution.classpath_string(), "");
    assert!(resolution.dependency_tree().is_empty());
}

#[tokio::test]
async fn missing_metadata_aborts_in_strict_mode() {
    let repo = FakeRepository::new().with("g:a:1", &[("g:ghost:1", Scope::Compile)]);
    let err = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap_err();

    match err {
        JarpathError::MissingMetadata { coordinate } => assert_eq!(coordinate, "g:ghost:jar:1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn lenient_mode_returns_best_effort_graph() {
    let repo = FakeRepository::new()
        .with("g:a:1", &[("g:ghost:1", Scope::Compile), ("g:ok:1", Scope::Compile)])
        .with("g:ok:1", &[("g:down:1", Scope::Compile)])
        .unreachable("g:down:1");
    let config = ResolveConfig {
        lenient_metadata: true,
        ..offline_config()
    };
    let resolution = resolve_with(Arc::new(repo), vec![declare("g:a:1", Scope::Compile)], config)
        .await
        .unwrap();

    assert!(resolution.is_partial());
    assert_eq!(resolution.failures.len(), 2);
    assert!(matches!(
        resolution.failures[0],
        JarpathError::MissingMetadata { .. }
    ));
    assert!(matches!(resolution.failures[1], JarpathError::Transport { .. }));
    assert_eq!(
        resolution.notations(),
        ["g:a:jar:1", "g:ghost:jar:1", "g:ok:jar:1", "g:down:jar:1"]
    );
}

#[tokio::test]
async fn exclusions_apply_to_the_whole_subtree() {
    let a = coord("g:a:1");
    let repo = FakeRepository::new()
        .with_edges(
            "g:a:1",
            vec![DependencyEdge::new(a.clone(), coord("g:b:1"), Scope::Compile)
                .exclude(Exclusion::new("org.logging", "*"))],
        )
        .with(
            "g:b:1",
            &[("g:c:1", Scope::Compile), ("org.logging:api:1", Scope::Compile)],
        )
        .with("g:c:1", &[("org.logging:impl:1", Scope::Compile)]);
    let root = declare("g:a:1", Scope::Compile).exclude(Exclusion::new("g", "c"));

    let resolution = resolve_with(Arc::new(repo), vec![root], offline_config())
        .await
        .unwrap();

    assert_eq!(resolution.notations(), ["g:a:jar:1", "g:b:jar:1"]);
}

#[tokio::test]
async fn optional_subtrees_are_followed_and_flagged() {
    let a = coord("g:a:1");
    let repo = || {
        Arc::new(
            FakeRepository::new()
                .with_edges(
                    "g:a:1",
                    vec![DependencyEdge::new(a.clone(), coord("g:opt:1"), Scope::Compile)
                        .optional(true)],
                )
                .with("g:opt:1", &[("g:deep:1", Scope::Compile)])
                .leaf("g:deep:1"),
        )
    };

    let followed = resolve_with(repo(), vec![declare("g:a:1", Scope::Compile)], offline_config())
        .await
        .unwrap();
    assert_eq!(followed.notations(), ["g:a:jar:1", "g:opt:jar:1", "g:deep:jar:1"]);
    let optional: Vec<bool> = followed.resolved.iter().map(|e| e.optional).collect();
    assert_eq!(optional, [false, true, true]);

    let config = ResolveConfig {
        ignore_optional_subtrees: true,
        ..offline_config()
    };
    let pruned = resolve_with(repo(), vec![declare("g:a:1", Scope::Compile)], config)
        .await
        .unwrap();
    assert_eq!(pruned.notations(), ["g:a:jar:1", "g:opt:jar:1"]);
}

#[tokio::test]
async fn required_path_expands_after_ignored_optional_one() {
    let x = coord("g:x:1");
    let repo = Arc::new(
        FakeRepository::new()
            .with_edges(
                "g:x:1",
                vec![DependencyEdge::new(x, coord("g:opt:1"), Scope::Compile).optional(true)],
            )
            .with("g:y:1", &[("g:opt:1", Scope::Compile)])
            .with("g:opt:1", &[("g:deep:1", Scope::Compile)])
            .leaf("g:deep:1"),
    );
    let config = ResolveConfig {
        ignore_optional_subtrees: true,
        ..offline_config()
    };

    let resolution = resolve_with(
        repo,
        vec![declare("g:x:1", Scope::Compile), declare("g:y:1", Scope::Compile)],
        config,
    )
    .await
    .unwrap();

    assert_eq!(
        resolution.notations(),
        ["g:x:jar:1", "g:y:jar:1", "g:opt:jar:1", "g:deep:jar:1"]
    );
    assert!(resolution.resolved.iter().all(|e| !e.optional));
}

#[tokio::test]
async fn widened_scope_carries_into_transitive_children() {
    let repo = || {
        Arc::new(
            FakeRepository::new()
                .with("g:t:1", &[("g:s:1", Scope::Compile)])
                .with("g:c:1", &[("g:s:1", Scope::Compile)])
                .with("g:s:1", &[("g:d:1", Scope::Compile)])
                .leaf("g:d:1"),
        )
    };
    let roots = || vec![declare("g:t:1", Scope::Test), declare("g:c:1", Scope::Compile)];

    let resolution = resolve_with(repo(), roots(), offline_config()).await.unwrap();
    assert_eq!(
        summary(&resolution),
        [
            "g:t:jar:1 (test)",
            "g:c:jar:1 (compile)",
            "g:s:jar:1 (compile)",
            "g:d:jar:1 (compile)",
        ]
    );

    let config = ResolveConfig {
        scope_filter: Some(BTreeSet::from([Scope::Compile, Scope::Runtime])),
        ..offline_config()
    };
    let filtered = resolve_with(repo(), roots(), config).await.unwrap();
    assert_eq!(
        filtered.notations(),
        ["g:c:jar:1", "g:s:jar:1", "g:d:jar:1"]
    );
}

#[tokio::test]
async fn optional_entries_can_be_left_off_the_classpath() {
    let a = coord("g:a:1");
    let repo = FakeRepository::new()
        .with_edges(
            "g:a:1",
            vec![DependencyEdge::new(a, coord("g:opt:1"), Scope::Compile).optional(true)],
        )
        .leaf("g:opt:1");
    let materializer = Arc::new(FakeMaterializer::default());
    let mut ctx = ResolutionContext::new(ResolveConfig {
        include_optional_in_classpath: false,
        ..ResolveConfig::default()
    });
    ctx.add_dependency(declare("g:a:1", Scope::Compile));

    let collaborators =
        Collaborators::new(Arc::new(repo)).with_materializer(materializer.clone());
    let resolution = ctx
        .resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.classpath(), [PathBuf::from("/m2/a-1.jar")]);
    assert_eq!(materializer.call_count(), 1);
}

#[tokio::test]
async fn scope_filter_restricts_resolved_set() {
    let repo = FakeRepository::new()
        .with("g:a:1", &[("g:rt:1", Scope::Runtime)])
        .leaf("g:rt:1")
        .leaf("g:junit:4");
    let config = ResolveConfig {
        scope_filter: Some(BTreeSet::from([Scope::Compile, Scope::Runtime])),
        ..offline_config()
    };
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile), declare("g:junit:4", Scope::Test)],
        config,
    )
    .await
    .unwrap();

    assert_eq!(resolution.notations(), ["g:a:jar:1", "g:rt:jar:1"]);
}

#[tokio::test]
async fn materialized_paths_follow_resolution_order() {
    let repo = FakeRepository::new()
        .with("g:b:1", &[("g:c:1", Scope::Compile)])
        .leaf("g:a:1")
        .leaf("g:c:1");
    let materializer = Arc::new(FakeMaterializer::default());
    let mut ctx = ResolutionContext::new(ResolveConfig::default());
    ctx.add_dependency(declare("g:b:1", Scope::Compile));
    ctx.add_dependency(declare("g:a:1", Scope::Compile));

    let collaborators =
        Collaborators::new(Arc::new(repo)).with_materializer(materializer.clone());
    let resolution = ctx
        .resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        resolution.classpath(),
        ["/m2/b-1.jar", "/m2/a-1.jar", "/m2/c-1.jar"].map(PathBuf::from)
    );
    assert_eq!(resolution.paths()[0].0, "g:b:jar:1");
}

#[tokio::test]
async fn metadata_is_fetched_once_per_coordinate() {
    let repo = Arc::new(
        FakeRepository::new()
            .with("g:a:1", &[("g:shared:1", Scope::Compile)])
            .with("g:b:1", &[("g:shared:1", Scope::Compile)])
            .leaf("g:shared:1"),
    );
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:a:1", Scope::Compile));
    ctx.add_dependency(declare("g:b:1", Scope::Compile));
    let collaborators = Collaborators::new(repo.clone());

    ctx.resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(repo.fetched("g:shared:1"), 1);

    ctx.resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(repo.fetch_count(), 3);
}

#[tokio::test]
async fn cancellation_keeps_previous_resolution() {
    let repo = Arc::new(FakeRepository::new().leaf("g:a:1").leaf("g:b:1"));
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:a:1", Scope::Compile));
    let collaborators = Collaborators::new(repo);
    let first = ctx
        .resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();

    ctx.add_dependency(declare("g:b:1", Scope::Compile));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ctx.resolve(&collaborators, cancel).await.unwrap_err();

    assert!(matches!(err, JarpathError::Cancelled));
    assert!(Arc::ptr_eq(ctx.current().unwrap(), &first));
}

#[tokio::test]
async fn failed_resolution_keeps_previous_resolution() {
    let repo = Arc::new(FakeRepository::new().leaf("g:a:1"));
    let mut ctx = ResolutionContext::new(offline_config());
    ctx.add_dependency(declare("g:a:1", Scope::Compile));
    let collaborators = Collaborators::new(repo);
    ctx.resolve(&collaborators, CancellationToken::new())
        .await
        .unwrap();

    ctx.add_dependency(declare("g:missing:1", Scope::Compile));
    assert!(ctx
        .resolve(&collaborators, CancellationToken::new())
        .await
        .is_err());

    assert_eq!(ctx.current().unwrap().notations(), ["g:a:jar:1"]);
}

#[tokio::test]
async fn dependency_tree_reflects_resolved_versions() {
    let repo = FakeRepository::new()
        .with("g:a:1", &[("g:c:1", Scope::Compile)])
        .with("g:b:1", &[("g:c:2", Scope::Compile)])
        .leaf("g:c:1");
    let resolution = resolve_with(
        Arc::new(repo),
        vec![declare("g:a:1", Scope::Compile), declare("g:b:1", Scope::Compile)],
        offline_config(),
    )
    .await
    .unwrap();

    let json = serde_json::to_value(resolution.dependency_tree()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "g:a:jar:1": { "g:c:jar:1": {} },
            "g:b:jar:1": { "g:c:jar:1": {} },
        })
    );
}
