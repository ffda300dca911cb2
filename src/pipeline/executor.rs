//! Import plan executor.
//!
//! The executor compiles every step, optionally backs up the state, then
//! walks the steps in order. For each candidate resource it checks the
//! allow-list, reads the import ID and evaluates the condition. Then, for
//! each of the step's templates, it resolves the target address, applies the
//! transform and runs (or describes) the import unless the target is already
//! managed. Skips are recorded in the report; anything else stops the run.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::address::ImportTemplate;
use crate::config::ImportPlan;
use crate::error::Result;
use crate::state::{ResourceIndex, StateBackup, StateResource};
use crate::terraform::{Terraform, DEFAULT_BINARY};

use super::condition;
use super::report::{ImportOutcome, RunReport, SkipReason, StepReport};
use super::step::CompiledStep;

/// Executor for import plans.
pub struct ImportExecutor<'a, T: Terraform + ?Sized> {
    /// State-management binary driver.
    terraform: &'a T,
    /// Only describe imports.
    dry_run: bool,
    /// Backup destination, when a backup is requested.
    backup: Option<StateBackup>,
    /// Binary name shown in dry-run lines.
    binary: String,
}

impl<'a, T: Terraform + ?Sized> ImportExecutor<'a, T> {
    /// Creates a new executor.
    #[must_use]
    pub fn new(terraform: &'a T) -> Self {
        Self {
            terraform,
            dry_run: false,
            backup: None,
            binary: String::from(DEFAULT_BINARY),
        }
    }

    /// Sets whether imports are only described.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Requests a state backup into `dir` before any import.
    #[must_use]
    pub fn with_backup(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup = Some(StateBackup::new(dir));
        self
    }

    /// Sets the binary name shown in dry-run lines.
    #[must_use]
    pub fn with_binary_label(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Runs `plan` against the resources in `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if a step does not compile, the backup fails, an
    /// address cannot be resolved, a transform fails or an import fails.
    /// Nothing is imported when compilation or the backup fails.
    pub async fn run(&self, plan: &ImportPlan, index: &mut ResourceIndex<'_>) -> Result<RunReport> {
        let steps = CompiledStep::compile_all(&plan.steps)?;
        self.run_steps(&steps, index).await
    }

    /// Runs already compiled steps against the resources in `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup fails, an address cannot be resolved,
    /// a transform fails or an import fails.
    pub async fn run_steps(
        &self,
        steps: &[CompiledStep],
        index: &mut ResourceIndex<'_>,
    ) -> Result<RunReport> {
        info!(
            "Running import plan with {} step(s){}",
            steps.len(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        let mut report = RunReport::new(self.dry_run);
        report.backup_path = self.backup_state().await?;

        let mut targets = HashSet::new();
        for step in steps {
            let step_report = self.run_step(step, index, &mut targets).await?;
            report.steps.push(step_report);
        }

        report.finish();
        info!("{}", report);
        Ok(report)
    }

    /// Writes the state backup, if one was requested and this is not a dry
    /// run.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be pulled or written.
    pub async fn backup_state(&self) -> Result<Option<PathBuf>> {
        let Some(backup) = &self.backup else {
            return Ok(None);
        };

        if self.dry_run {
            info!("Skipping state backup in dry-run mode");
            return Ok(None);
        }

        debug!("Pulling state for backup");
        let state = self.terraform.pull_state().await?;
        backup.write(&state).await.map(Some)
    }

    /// Runs one compiled step. Each candidate goes through every template
    /// before the next candidate starts.
    async fn run_step(
        &self,
        step: &CompiledStep,
        index: &mut ResourceIndex<'_>,
        targets: &mut HashSet<String>,
    ) -> Result<StepReport> {
        let mut report = StepReport::new(step.index(), step.import_name());
        let selector = step.selector();

        if selector.is_incomplete() {
            warn!(
                "Step {} ({}): for_each resource and attribute are both required, skipping",
                step.index(),
                step.import_name()
            );
            report.skipped = Some(SkipReason::SelectorIncomplete);
            return Ok(report);
        }

        let candidates = index.get(&selector.resource).to_vec();
        debug!(
            "Step {} ({}): {} candidate(s) of type {}",
            step.index(),
            step.import_name(),
            candidates.len(),
            selector.resource
        );

        for resource in candidates {
            let raw_value = match Self::admit(step, resource) {
                Ok(value) => value,
                Err(reason) => {
                    report.outcomes.push(ImportOutcome::skipped(resource, reason));
                    continue;
                }
            };

            for template in step.templates() {
                let outcome = self
                    .process(step, template, resource, &raw_value, index, targets)
                    .await
                    .map_err(|e| e.in_step(step.index(), template.as_str()))?;
                report.outcomes.push(outcome);
            }
        }

        Ok(report)
    }

    /// Checks the allow-list, import ID and condition for one candidate,
    /// returning its raw import ID.
    fn admit(
        step: &CompiledStep,
        resource: &StateResource,
    ) -> std::result::Result<String, SkipReason> {
        if !step.selector().allows(&resource.name) {
            debug!("Resource {} is not in for_each.values, skipping", resource.address);
            return Err(SkipReason::NotInAllowList);
        }

        let raw_value = step.source_value(resource).inspect_err(|reason| {
            warn!("Skipping resource {}: {}", resource.address, reason);
        })?;

        if !condition::check(step.condition_key(), resource) {
            info!(
                "Condition {} not met for resource: {}, skipping",
                step.condition_key(),
                resource.address
            );
            return Err(SkipReason::ConditionNotMet {
                key: step.condition_key().to_string(),
            });
        }

        Ok(raw_value)
    }

    /// Resolves, transforms and imports one candidate under one template.
    async fn process(
        &self,
        step: &CompiledStep,
        template: &ImportTemplate,
        resource: &StateResource,
        raw_value: &str,
        index: &mut ResourceIndex<'_>,
        targets: &mut HashSet<String>,
    ) -> Result<ImportOutcome> {
        let address = template.resolve(resource)?;

        if index.contains(template.resource_type(), &address) || targets.contains(&address) {
            info!("{} is already managed, skipping", address);
            return Ok(ImportOutcome::skipped(
                resource,
                SkipReason::AlreadyManaged { address },
            ));
        }

        let value = step.transform().apply(raw_value)?;

        if self.dry_run {
            let line = format!(
                "[DryRun] Executing: {} import '{}' '{}'",
                self.binary, address, value
            );
            info!("{}", line);
            targets.insert(address.clone());
            return Ok(ImportOutcome::DryRun {
                source: resource.address.clone(),
                address,
                value,
                line,
            });
        }

        info!("Importing {} as {} (from {})", value, address, resource.address);
        self.terraform.import(&address, &value).await?;
        targets.insert(address.clone());

        Ok(ImportOutcome::Imported {
            source: resource.address.clone(),
            address,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Condition, ForEachBlock, ImportStep, ValueTransform};
    use crate::error::{TerraformError, TfBulkError};
    use crate::state::StateSnapshot;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    mock! {
        Tf {}

        #[async_trait]
        impl Terraform for Tf {
            async fn show_state(&self) -> Result<StateSnapshot>;
            async fn import(&self, address: &str, id: &str) -> Result<()>;
            async fn pull_state(&self) -> Result<String>;
        }
    }

    type Calls = Arc<Mutex<Vec<(String, String)>>>;

    /// A mock that records every import call and succeeds.
    fn recording_mock() -> (MockTf, Calls) {
        let calls: Calls = Arc::default();
        let recorded = Arc::clone(&calls);

        let mut mock = MockTf::new();
        mock.expect_import().returning(move |address, id| {
            recorded
                .lock()
                .unwrap()
                .push((address.to_string(), id.to_string()));
            Ok(())
        });
        (mock, calls)
    }

    fn snapshot() -> StateSnapshot {
        let state = json!({
            "format_version": "1.0",
            "values": {
                "root_module": {
                    "resources": [
                        {
                            "address": "aws_s3_bucket.logs",
                            "mode": "managed",
                            "type": "aws_s3_bucket",
                            "name": "logs",
                            "values": {
                                "bucket": "acme-prod-logs",
                                "policy": "{\"Version\":\"2012-10-17\"}",
                                "versioning": [{ "enabled": true }]
                            }
                        },
                        {
                            "address": "aws_s3_bucket.assets",
                            "mode": "managed",
                            "type": "aws_s3_bucket",
                            "name": "assets",
                            "values": {
                                "bucket": "acme-prod-assets",
                                "policy": "",
                                "versioning": [{ "enabled": false }]
                            }
                        },
                        {
                            "address": "aws_s3_bucket.scratch",
                            "mode": "managed",
                            "type": "aws_s3_bucket",
                            "name": "scratch",
                            "values": { "policy": "{}" }
                        }
                    ],
                    "child_modules": [
                        {
                            "address": "module.net",
                            "resources": [
                                {
                                    "address": "module.net.aws_subnet.this[0]",
                                    "mode": "managed",
                                    "type": "aws_subnet",
                                    "name": "this",
                                    "index": 0,
                                    "values": { "id": "subnet-0a1b2c" }
                                }
                            ]
                        }
                    ]
                }
            }
        });
        StateSnapshot::from_json(&state.to_string()).unwrap()
    }

    fn step(import_name: &str, resource: &str, attribute: &str) -> ImportStep {
        ImportStep {
            import_name: import_name.to_string(),
            for_each: ForEachBlock {
                resource: resource.to_string(),
                attribute: attribute.to_string(),
                values: Vec::new(),
            },
            ..ImportStep::default()
        }
    }

    fn plan(steps: Vec<ImportStep>) -> ImportPlan {
        ImportPlan {
            version: String::from("1"),
            steps,
        }
    }

    #[tokio::test]
    async fn test_module_path_is_preserved() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let (mock, calls) = recording_mock();

        let report = ImportExecutor::new(&mock)
            .run(
                &plan(vec![step("aws_subnet_v2.renamed[0]", "aws_subnet", "id")]),
                &mut index,
            )
            .await
            .unwrap();

        assert_eq!(report.imported_count(), 1);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![(
                String::from("module.net.aws_subnet_v2.renamed[0]"),
                String::from("subnet-0a1b2c")
            )]
        );
    }

    #[tokio::test]
    async fn test_dry_run_never_imports() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);
        mock.expect_pull_state().times(0);

        let report = ImportExecutor::new(&mock)
            .with_dry_run(true)
            .with_backup("/nonexistent/backups")
            .with_binary_label("tofu")
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await
            .unwrap();

        assert!(report.dry_run);
        assert!(report.backup_path.is_none());
        assert_eq!(
            report.dry_run_lines(),
            vec![
                "[DryRun] Executing: tofu import 'aws_s3_bucket_acl.logs' 'acme-prod-logs'",
                "[DryRun] Executing: tofu import 'aws_s3_bucket_acl.assets' 'acme-prod-assets'",
            ]
        );
        // `scratch` has no bucket attribute.
        assert_eq!(report.skipped_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_template_aborts_before_any_import() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);
        mock.expect_pull_state().times(0);

        let result = ImportExecutor::new(&mock)
            .with_backup("/nonexistent/backups")
            .run(
                &plan(vec![
                    step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket"),
                    step("a.b.c", "aws_s3_bucket", "bucket"),
                ]),
                &mut index,
            )
            .await;

        assert!(matches!(result, Err(TfBulkError::Step { index: 1, .. })));
        assert_eq!(index.traversal_count(), 0);
    }

    #[tokio::test]
    async fn test_condition_and_allow_list_skips() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let (mock, calls) = recording_mock();

        let mut policy = step("aws_s3_bucket_policy", "aws_s3_bucket", "bucket");
        policy.condition = Condition {
            key: String::from("policy"),
        };
        let mut versioning = step("aws_s3_bucket_versioning.main", "aws_s3_bucket", "bucket");
        versioning.condition = Condition {
            key: String::from("versioning.0.enabled"),
        };
        versioning.for_each.values = vec![String::from("logs"), String::from("assets")];

        let report = ImportExecutor::new(&mock)
            .run(&plan(vec![policy, versioning]), &mut index)
            .await
            .unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (
                    String::from("aws_s3_bucket_policy.logs"),
                    String::from("acme-prod-logs")
                ),
                (
                    String::from("aws_s3_bucket_versioning.main"),
                    String::from("acme-prod-logs")
                ),
            ]
        );

        let second = &report.steps[1].outcomes;
        assert_eq!(
            second[1],
            ImportOutcome::Skipped {
                source: String::from("aws_s3_bucket.assets"),
                reason: SkipReason::ConditionNotMet {
                    key: String::from("versioning.0.enabled")
                },
            }
        );
        assert_eq!(
            second[2],
            ImportOutcome::Skipped {
                source: String::from("aws_s3_bucket.scratch"),
                reason: SkipReason::NotInAllowList,
            }
        );
        // One walk for the source type, one per target type checked.
        assert_eq!(index.traversal_count(), 3);
    }

    #[tokio::test]
    async fn test_incomplete_selector_skips_step() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);

        let report = ImportExecutor::new(&mock)
            .run(&plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "")]), &mut index)
            .await
            .unwrap();

        assert_eq!(report.steps[0].skipped, Some(SkipReason::SelectorIncomplete));
        assert!(report.steps[0].outcomes.is_empty());
        assert_eq!(index.traversal_count(), 0);
    }

    #[tokio::test]
    async fn test_transform_applies_to_value() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let (mock, calls) = recording_mock();

        let mut suffixed = step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket");
        suffixed.for_each.values = vec![String::from("logs")];
        suffixed.transform = ValueTransform {
            action: String::from("useSuffix"),
            value: json!(4),
        };

        ImportExecutor::new(&mock)
            .run(&plan(vec![suffixed]), &mut index)
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap()[0].1, "logs");
    }

    #[tokio::test]
    async fn test_transform_failure_is_fatal() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);

        let mut too_long = step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket");
        too_long.transform = ValueTransform {
            action: String::from("useSuffix"),
            value: json!(100),
        };

        let result = ImportExecutor::new(&mock)
            .run(&plan(vec![too_long]), &mut index)
            .await;

        assert!(matches!(
            result,
            Err(TfBulkError::Step { source, .. }) if matches!(*source, TfBulkError::Transform(_))
        ));
    }

    #[tokio::test]
    async fn test_import_failure_stops_the_run() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(1).returning(|_, _| {
            Err(TerraformError::CommandFailed {
                command: String::from("terraform import"),
                code: 1,
                stderr: String::from("Error: resource already managed"),
            }
            .into())
        });

        let result = ImportExecutor::new(&mock)
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_external());
        assert!(matches!(err, TfBulkError::Step { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_backup_written_before_imports() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let (mut mock, calls) = recording_mock();
        let seen_at_pull = Arc::clone(&calls);
        mock.expect_pull_state().times(1).returning(move || {
            assert!(seen_at_pull.lock().unwrap().is_empty());
            Ok(String::from("{\"version\":4}"))
        });

        let report = ImportExecutor::new(&mock)
            .with_backup(temp.path().join("backups"))
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await
            .unwrap();

        let backup = report.backup_path.as_ref().expect("backup path recorded");
        assert!(backup.starts_with(temp.path().join("backups")));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{\"version\":4}");
        assert_eq!(report.imported_count(), 2);
    }

    #[tokio::test]
    async fn test_backup_failure_aborts_before_imports() {
        let mut mock = MockTf::new();
        mock.expect_import().times(0);
        mock.expect_pull_state().times(1).returning(|| {
            Err(TerraformError::NotInstalled {
                binary: String::from("terraform"),
                message: String::from("not found"),
            }
            .into())
        });

        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let result = ImportExecutor::new(&mock)
            .with_backup("backups")
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(index.traversal_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_state() {
        let state = StateSnapshot::from_json(r#"{"format_version":"1.0"}"#).unwrap();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);

        let report = ImportExecutor::new(&mock)
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await
            .unwrap();

        assert!(report.steps[0].outcomes.is_empty());
        assert_eq!(report.imported_count(), 0);
    }

    #[tokio::test]
    async fn test_templates_run_per_resource() {
        let state = StateSnapshot::from_json(
            &json!({
                "values": {
                    "root_module": {
                        "resources": [
                            {
                                "address": "aws_s3_bucket.a",
                                "mode": "managed",
                                "type": "aws_s3_bucket",
                                "name": "a",
                                "values": { "bucket": "bucket-a" }
                            },
                            {
                                "address": "aws_s3_bucket.b",
                                "mode": "managed",
                                "type": "aws_s3_bucket",
                                "name": "b",
                                "values": { "bucket": "bucket-b" }
                            }
                        ]
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        let mut index = ResourceIndex::new(&state);
        let (mock, calls) = recording_mock();

        let fan_out = CompiledStep::fan_out(
            ForEachBlock {
                resource: String::from("aws_s3_bucket"),
                attribute: String::from("bucket"),
                values: Vec::new(),
            },
            &[
                String::from("aws_s3_bucket_acl"),
                String::from("aws_s3_bucket_policy"),
            ],
        )
        .unwrap();

        let report = ImportExecutor::new(&mock)
            .run_steps(&[fan_out], &mut index)
            .await
            .unwrap();

        let addresses: Vec<String> = calls
            .lock()
            .unwrap()
            .iter()
            .map(|(address, _)| address.clone())
            .collect();
        assert_eq!(
            addresses,
            vec![
                "aws_s3_bucket_acl.a",
                "aws_s3_bucket_policy.a",
                "aws_s3_bucket_acl.b",
                "aws_s3_bucket_policy.b",
            ]
        );
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.imported_count(), 4);
    }

    #[tokio::test]
    async fn test_already_managed_target_is_skipped() {
        let state = StateSnapshot::from_json(
            &json!({
                "values": {
                    "root_module": {
                        "resources": [
                            {
                                "address": "aws_s3_bucket.a",
                                "mode": "managed",
                                "type": "aws_s3_bucket",
                                "name": "a",
                                "values": { "bucket": "bucket-a" }
                            },
                            {
                                "address": "aws_s3_bucket_acl.a",
                                "mode": "managed",
                                "type": "aws_s3_bucket_acl",
                                "name": "a",
                                "values": { "bucket": "bucket-a" }
                            }
                        ]
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        let mut index = ResourceIndex::new(&state);
        let mut mock = MockTf::new();
        mock.expect_import().times(0);

        let report = ImportExecutor::new(&mock)
            .run(
                &plan(vec![step("aws_s3_bucket_acl", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await
            .unwrap();

        assert_eq!(
            report.steps[0].outcomes,
            vec![ImportOutcome::Skipped {
                source: String::from("aws_s3_bucket.a"),
                reason: SkipReason::AlreadyManaged {
                    address: String::from("aws_s3_bucket_acl.a")
                },
            }]
        );
        assert_eq!(report.imported_count(), 0);
    }

    #[tokio::test]
    async fn test_same_target_imported_once_per_run() {
        let state = snapshot();
        let mut index = ResourceIndex::new(&state);
        let (mock, calls) = recording_mock();

        // A fixed name maps both buckets to one address.
        let report = ImportExecutor::new(&mock)
            .run(
                &plan(vec![step("aws_s3_bucket_acl.shared", "aws_s3_bucket", "bucket")]),
                &mut index,
            )
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(matches!(
            report.steps[0].outcomes[1],
            ImportOutcome::Skipped {
                reason: SkipReason::AlreadyManaged { .. },
                ..
            }
        ));
    }
}
