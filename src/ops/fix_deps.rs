//! Implementation of `autodeps fix`.
//!
//! Each eligible target goes through the same pipeline: scan its files,
//! classify every include, accumulate internal and external choices, drop
//! the self-reference, inject derived deps, pick the best assignment and
//! diff it against the hand-written declaration.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;

use crate::core::target::TAG_NOFIXDEPS;
use crate::core::{BuildFile, HeaderIndex, Target};
use crate::ops::apply::Applier;
use crate::ops::commands::{diff_commands, MutationCommand};
use crate::ops::scan::{IncludeScanner, ScanResult};
use crate::resolver::{
    Assignment, ChoiceSet, Classification, Classifier, MappingTables, ResolveError, ScoreStrategy,
    Scorer, UnresolvedHeader,
};

/// Default marker symbols of the legacy codegen interface.
pub const DEFAULT_CODEGEN_MARKERS: &[&str] = &["grpc::g_glip", "grpc:g_core_codegen_interface"];

/// Default dependency injected when a codegen marker is found.
pub const DEFAULT_CODEGEN_DEP: &str = "grpc++_codegen_base_src";

/// Options for fixing dependencies.
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Restrict processing to these targets (empty = all)
    pub targets: Vec<String>,

    /// Base-score strategy
    pub strategy: ScoreStrategy,

    /// Only targets carrying this tag are processed
    pub opt_in_tag: Option<String>,

    /// Symbols whose presence injects `codegen_dep`
    pub codegen_markers: Vec<String>,

    /// Dependency injected for codegen users
    pub codegen_dep: String,

    /// Write external deps through the temporary `deps` field
    pub external_via_deps: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        FixOptions {
            targets: Vec::new(),
            strategy: ScoreStrategy::default(),
            opt_in_tag: None,
            codegen_markers: DEFAULT_CODEGEN_MARKERS.iter().map(|s| s.to_string()).collect(),
            codegen_dep: DEFAULT_CODEGEN_DEP.to_string(),
            external_via_deps: true,
        }
    }
}

/// Why a target was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not in the explicit target list
    NotRequested,
    /// Tagged `nofixdeps`
    Exempt,
    /// Uses a conditional dependency form
    SelectDeps,
    /// Lacks the configured opt-in tag
    NotOptedIn,
}

/// Terminal state of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TargetOutcome {
    Skipped { reason: SkipReason },
    Resolved { commands: Vec<MutationCommand> },
    Failed {
        commands: Vec<MutationCommand>,
        unresolved: Vec<String>,
    },
}

impl TargetOutcome {
    /// Commands emitted for the target, if any.
    pub fn commands(&self) -> &[MutationCommand] {
        match self {
            TargetOutcome::Skipped { .. } => &[],
            TargetOutcome::Resolved { commands } | TargetOutcome::Failed { commands, .. } => {
                commands
            }
        }
    }
}

/// Outcome of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub target: String,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
}

/// Outcome of a whole run, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixReport {
    pub targets: Vec<TargetReport>,
}

impl FixReport {
    /// The full command batch, in processing order.
    pub fn commands(&self) -> Vec<MutationCommand> {
        self.targets
            .iter()
            .flat_map(|report| report.outcome.commands().iter().cloned())
            .collect()
    }

    /// Every unresolvable header, with the target that included it.
    pub fn unresolved(&self) -> Vec<UnresolvedHeader> {
        self.targets
            .iter()
            .flat_map(|report| match &report.outcome {
                TargetOutcome::Failed { unresolved, .. } => unresolved
                    .iter()
                    .map(|header| UnresolvedHeader {
                        target: report.target.clone(),
                        header: header.clone(),
                    })
                    .collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Whether any header could not be classified.
    pub fn has_errors(&self) -> bool {
        self.targets
            .iter()
            .any(|report| matches!(report.outcome, TargetOutcome::Failed { .. }))
    }

    /// The aggregated classification failure, if any.
    pub fn error(&self) -> Option<ResolveError> {
        let headers = self.unresolved();
        (!headers.is_empty()).then_some(ResolveError::Unresolvable { headers })
    }

    /// Look up the report of one target.
    pub fn target(&self, name: &str) -> Option<&TargetReport> {
        self.targets.iter().find(|report| report.target == name)
    }
}

/// Choices accumulated from one target's includes.
#[derive(Debug, Clone, Default)]
pub struct Inference {
    /// Internal dependency alternatives, self-reference still included
    pub internal: ChoiceSet,
    /// External dependency alternatives
    pub external: ChoiceSet,
    /// Headers no rule matched
    pub unresolved: Vec<String>,
    /// Whether the legacy codegen interface is used
    pub uses_codegen: bool,
}

impl Inference {
    /// Classify each include and route it into the matching choice set.
    pub fn from_scan(classifier: &Classifier<'_>, target: &Target, scan: &ScanResult) -> Self {
        let mut inference = Inference {
            uses_codegen: scan.uses_codegen,
            ..Inference::default()
        };

        for header in &scan.includes {
            let classification = classifier.classify(header);
            tracing::trace!("{}: {} -> {}", target.name, header, classification);
            match classification {
                Classification::InternalFixed(name) => inference.internal.add(&name),
                Classification::InternalCandidates(candidates) => {
                    inference.internal.add_one_of(&candidates)
                }
                Classification::ExternalFixed(name) | Classification::ExternalNamespace(name) => {
                    inference.external.add(&name)
                }
                Classification::SystemIgnored => {}
                Classification::Unresolvable(header) => {
                    tracing::error!("{}: can't categorize header: {}", target.name, header);
                    inference.unresolved.push(header);
                }
            }
        }

        inference
    }

    /// Pick the final internal and external lists for `target`.
    pub fn select(
        mut self,
        target: &Target,
        scorer: &Scorer<'_>,
        opts: &FixOptions,
    ) -> (Assignment, Assignment) {
        self.internal.remove(&target.name);
        if self.uses_codegen && opts.codegen_dep != target.name {
            self.internal.add(&opts.codegen_dep);
        }

        tracing::debug!(
            "{}: {} internal and {} external alternatives",
            target.name,
            self.internal.len(),
            self.external.len()
        );

        let deps = self
            .internal
            .best(|alternative| scorer.score(alternative, &target.deps));
        let external_deps = self
            .external
            .best(|alternative| scorer.score(alternative, &target.external_deps));
        (deps, external_deps)
    }
}

/// Decide whether `target` takes part in this run.
pub fn eligibility(target: &Target, opts: &FixOptions) -> Option<SkipReason> {
    if !opts.targets.is_empty() && !opts.targets.iter().any(|name| *name == target.name) {
        return Some(SkipReason::NotRequested);
    }
    if target.has_tag(TAG_NOFIXDEPS) {
        return Some(SkipReason::Exempt);
    }
    if target.has_select_deps {
        return Some(SkipReason::SelectDeps);
    }
    if let Some(tag) = &opts.opt_in_tag {
        if !target.has_tag(tag) {
            return Some(SkipReason::NotOptedIn);
        }
    }
    None
}

/// Infer dependencies for every target of `build` and collect the commands.
///
/// Unresolvable headers are recorded per target and never stop the run;
/// an unreadable declared file does.
pub fn fix_deps(
    build: &BuildFile,
    tables: &MappingTables,
    opts: &FixOptions,
) -> Result<FixReport, ResolveError> {
    for name in &opts.targets {
        if build.target(name).is_none() {
            tracing::warn!(
                "requested target `{}` is not declared in {}",
                name,
                build.path().display()
            );
        }
    }

    let index = HeaderIndex::build(build.targets());
    let classifier = Classifier::new(&index, tables);
    let scorer = Scorer::new(opts.strategy, build.targets());
    let scanner = IncludeScanner::new(opts.codegen_markers.clone());

    let mut report = FixReport::default();
    for target in build.targets() {
        if let Some(reason) = eligibility(target, opts) {
            tracing::debug!("{}: skipped ({:?})", target.name, reason);
            report.targets.push(TargetReport {
                target: target.name.clone(),
                outcome: TargetOutcome::Skipped { reason },
            });
            continue;
        }

        let scan = scanner.scan_target(build.root(), target)?;
        let inference = Inference::from_scan(&classifier, target, &scan);
        let unresolved = inference.unresolved.clone();
        let (deps, external_deps) = inference.select(target, &scorer, opts);

        let commands = diff_commands(
            &target.name,
            &deps,
            &target.deps,
            &external_deps,
            &target.external_deps,
            opts.external_via_deps,
        );
        if !commands.is_empty() {
            tracing::info!("{}: {} commands", target.name, commands.len());
        }

        let outcome = if unresolved.is_empty() {
            TargetOutcome::Resolved { commands }
        } else {
            TargetOutcome::Failed {
                commands,
                unresolved,
            }
        };
        report.targets.push(TargetReport {
            target: target.name.clone(),
            outcome,
        });
    }

    Ok(report)
}

/// Fix dependencies and submit the full batch to `applier` in one call.
///
/// An apply failure aborts immediately; classification failures are left
/// in the returned report for the caller to turn into an exit status.
pub fn fix_and_apply(
    build: &BuildFile,
    tables: &MappingTables,
    opts: &FixOptions,
    applier: &dyn Applier,
) -> Result<FixReport> {
    let report = fix_deps(build, tables, opts)?;
    let commands = report.commands();
    if !commands.is_empty() {
        applier.apply(&commands)?;
    }
    Ok(report)
}

/// Every target that should be processed, before any scanning happens.
pub fn eligible_targets<'a>(build: &'a BuildFile, opts: &FixOptions) -> BTreeSet<&'a str> {
    build
        .targets()
        .filter(|target| eligibility(target, opts).is_none())
        .map(|target| target.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::apply::TomlApplier;
    use crate::ops::commands::{DEPS, EXTERNAL_DEPS};
    use crate::test_support::{RecordingApplier, TreeFixture};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn run(fixture: &TreeFixture, opts: &FixOptions) -> FixReport {
        fix_deps(&fixture.load(), &MappingTables::default(), opts).unwrap()
    }

    #[test]
    fn test_single_provider() {
        let fixture = TreeFixture::single_provider();
        let report = run(&fixture, &FixOptions::default());

        let foo = report.target("foo").unwrap();
        assert_eq!(
            foo.outcome,
            TargetOutcome::Resolved {
                commands: vec![MutationCommand::set("foo", DEPS, ["bar"])]
            }
        );
        assert!(!report.has_errors());
    }

    #[test]
    fn test_fixed_external_mapping() {
        let fixture = TreeFixture::new()
            .build_file("[[library]]\nname = \"client\"\nsrcs = [\"client.cc\"]\n")
            .file("client.cc", "#include \"absl/strings/str_cat.h\"\n");
        let report = run(&fixture, &FixOptions::default());

        let lines: Vec<String> = report.commands().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "set deps \"absl/strings\"|:client",
                "remove external_deps|:client",
                "rename deps external_deps|:client",
            ]
        );
    }

    #[test]
    fn test_ambiguous_provider_keeps_existing_choice() {
        let fixture = TreeFixture::ambiguous_provider();
        let build = fixture.load();
        let tables = MappingTables::default();
        let index = HeaderIndex::build(build.targets());
        let classifier = Classifier::new(&index, &tables);
        let consumer = build.target("consumer").unwrap();

        let scan = IncludeScanner::new(Vec::new())
            .scan_target(build.root(), consumer)
            .unwrap();
        let inference = Inference::from_scan(&classifier, consumer, &scan);
        let alternatives: Vec<_> = inference.internal.alternatives().cloned().collect();
        assert_eq!(alternatives, vec![set(&["impl_a"]), set(&["impl_b"])]);

        let scorer = Scorer::new(ScoreStrategy::EditDistance, build.targets());
        let (deps, _) = inference.select(consumer, &scorer, &FixOptions::default());
        assert_eq!(deps, set(&["impl_b"]));

        let report = fix_deps(&build, &tables, &FixOptions::default()).unwrap();
        assert!(report.target("consumer").unwrap().outcome.commands().is_empty());
    }

    #[test]
    fn test_self_reference_removed() {
        // impl_a and impl_b include the header they both declare.
        let fixture = TreeFixture::ambiguous_provider();
        let report = run(&fixture, &FixOptions::default());

        for name in ["impl_a", "impl_b"] {
            for command in report.target(name).unwrap().outcome.commands() {
                if let crate::ops::commands::Edit::Set { values, .. } = &command.edit {
                    assert!(!values.iter().any(|v| v == name));
                }
            }
        }
        // impl_a can be satisfied by impl_a itself, so it needs nothing.
        assert!(report.target("impl_a").unwrap().outcome.commands().is_empty());
    }

    #[test]
    fn test_opt_out_tag_skips_target() {
        let fixture = TreeFixture::new()
            .build_file(
                "[[library]]\nname = \"legacy\"\nsrcs = [\"legacy.cc\"]\ntags = [\"nofixdeps\"]\n",
            )
            .file("legacy.cc", "#include \"mystery/unknown.h\"\n#include \"zlib.h\"\n");
        let report = run(&fixture, &FixOptions::default());

        assert_eq!(
            report.target("legacy").unwrap().outcome,
            TargetOutcome::Skipped {
                reason: SkipReason::Exempt
            }
        );
        assert!(report.commands().is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_skip_reasons() {
        let fixture = TreeFixture::new().build_file(
            r#"
[[library]]
name = "conditional"
select_deps = { default = ["x"] }

[[library]]
name = "plain"

[[library]]
name = "tagged"
tags = ["autodeps"]
"#,
        );
        let build = fixture.load();

        let opts = FixOptions {
            opt_in_tag: Some("autodeps".to_string()),
            ..FixOptions::default()
        };
        assert_eq!(
            eligibility(build.target("conditional").unwrap(), &opts),
            Some(SkipReason::SelectDeps)
        );
        assert_eq!(
            eligibility(build.target("plain").unwrap(), &opts),
            Some(SkipReason::NotOptedIn)
        );
        assert_eq!(eligibility(build.target("tagged").unwrap(), &opts), None);

        let restricted = FixOptions {
            targets: vec!["plain".to_string()],
            ..FixOptions::default()
        };
        let eligible: BTreeSet<&str> = ["plain"].into_iter().collect();
        assert_eq!(eligible_targets(&build, &restricted), eligible);
    }

    #[test]
    fn test_unresolvable_does_not_block_other_targets() {
        let fixture = TreeFixture::new()
            .build_file(
                r#"
[[library]]
name = "a_first"
srcs = ["a.cc"]

[[library]]
name = "b_broken"
srcs = ["b.cc"]

[[library]]
name = "c_last"
srcs = ["c.cc"]
"#,
            )
            .file("a.cc", "#include \"zlib.h\"\n")
            .file("b.cc", "#include \"mystery/unknown.h\"\n#include \"re2/re2.h\"\n")
            .file("c.cc", "#include <openssl/ssl.h>\n");
        let opts = FixOptions {
            external_via_deps: false,
            ..FixOptions::default()
        };
        let report = run(&fixture, &opts);

        assert!(report.has_errors());
        assert_eq!(
            report.commands(),
            vec![
                MutationCommand::set("a_first", EXTERNAL_DEPS, ["madler_zlib"]),
                MutationCommand::set("b_broken", EXTERNAL_DEPS, ["re2"]),
                MutationCommand::set("c_last", EXTERNAL_DEPS, ["libssl"]),
            ]
        );
        let unresolved = report.unresolved();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].target, "b_broken");
        assert_eq!(unresolved[0].header, "mystery/unknown.h");
        assert!(report.error().is_some());
    }

    #[test]
    fn test_codegen_marker_injects_dep() {
        let fixture = TreeFixture::new()
            .build_file("[[library]]\nname = \"svc\"\nsrcs = [\"svc.cc\"]\n")
            .file("svc.cc", "void f() { grpc::g_glip->Init(); }\n");
        let report = run(&fixture, &FixOptions::default());

        assert_eq!(
            report.commands(),
            vec![MutationCommand::set("svc", DEPS, [DEFAULT_CODEGEN_DEP])]
        );
    }

    #[test]
    fn test_codegen_dep_does_not_depend_on_itself() {
        let fixture = TreeFixture::new()
            .build_file(&format!(
                "[[library]]\nname = \"{}\"\nsrcs = [\"codegen.cc\"]\n",
                DEFAULT_CODEGEN_DEP
            ))
            .file("codegen.cc", "grpc::g_glip = new CoreCodegen();\n");
        let report = run(&fixture, &FixOptions::default());

        assert!(report.commands().is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let fixture = TreeFixture::new()
            .build_file("[[library]]\nname = \"foo\"\nsrcs = [\"missing.cc\"]\n");
        let err = fix_deps(&fixture.load(), &MappingTables::default(), &FixOptions::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnreadableSource { .. }));
    }

    #[test]
    fn test_apply_then_rerun_is_idempotent() {
        let fixture = TreeFixture::single_provider()
            .file("foo.cc", "#include \"zlib.h\"\n#include \"foo.h\"\n");
        let path = fixture.build_file_path();
        let contents = std::fs::read_to_string(&path)
            .unwrap()
            .replace("hdrs = [\"foo.h\"]", "hdrs = [\"foo.h\"]\nsrcs = [\"foo.cc\"]\ndeps = [\"stale\"]");
        std::fs::write(&path, contents).unwrap();

        let tables = MappingTables::default();
        let opts = FixOptions::default();
        let first = fix_and_apply(&fixture.load(), &tables, &opts, &TomlApplier::new(&path)).unwrap();
        assert!(!first.commands().is_empty());

        let rebuilt = fixture.load();
        let foo = rebuilt.target("foo").unwrap();
        assert_eq!(foo.deps, set(&["bar"]));
        assert_eq!(foo.external_deps, set(&["madler_zlib"]));

        let second = fix_deps(&rebuilt, &tables, &opts).unwrap();
        assert!(second.commands().is_empty());
    }

    #[test]
    fn test_batch_submitted_once() {
        let fixture = TreeFixture::ambiguous_provider()
            .file("consumer.cc", "#include \"iface.h\"\n#include \"zlib.h\"\n");
        let applier = RecordingApplier::new();

        let report = fix_and_apply(
            &fixture.load(),
            &MappingTables::default(),
            &FixOptions::default(),
            &applier,
        )
        .unwrap();

        let batches = applier.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], report.commands());
    }

    #[test]
    fn test_apply_failure_is_fatal() {
        let fixture = TreeFixture::single_provider();
        let result = fix_and_apply(
            &fixture.load(),
            &MappingTables::default(),
            &FixOptions::default(),
            &RecordingApplier::failing(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_runs_are_deterministic() {
        let fixture = TreeFixture::ambiguous_provider()
            .file("consumer.cc", "#include \"iface.h\"\n#include \"bar.h\"\n")
            .file("bar.h", "")
            .build_file(
                r#"
[[library]]
name = "impl_a"
hdrs = ["iface.h", "bar.h"]

[[library]]
name = "impl_b"
hdrs = ["iface.h", "bar.h"]

[[library]]
name = "consumer"
srcs = ["consumer.cc"]
"#,
            );
        let opts = FixOptions {
            strategy: ScoreStrategy::ListSize,
            ..FixOptions::default()
        };

        let first = run(&fixture, &opts).commands();
        for _ in 0..5 {
            assert_eq!(run(&fixture, &opts).commands(), first);
        }
        assert_eq!(first, vec![MutationCommand::set("consumer", DEPS, ["impl_a"])]);
    }
}
