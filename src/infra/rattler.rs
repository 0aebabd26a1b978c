//! Package builds with rattler-build

use std::ffi::OsString;

use crate::config::ProjectLayout;
use crate::core::forge::PackageBuilder;
use crate::core::scheduler::ScheduledPackage;
use crate::error::ForgeError;
use crate::infra::filesystem;
use crate::infra::process::ToolCommand;

/// Builds recipes into the project's forge channel
#[derive(Debug, Clone)]
pub struct RattlerBuilder {
    layout: ProjectLayout,
    channels: Vec<String>,
}

impl RattlerBuilder {
    /// Build against `channels`, then the forge channel itself
    pub fn new(layout: ProjectLayout, channels: &[String]) -> Self {
        let mut resolved: Vec<String> = Vec::with_capacity(channels.len() + 1);
        for channel in channels.iter().cloned().chain([layout.forge_channel()]) {
            if !resolved.contains(&channel) {
                resolved.push(channel);
            }
        }
        Self {
            layout,
            channels: resolved,
        }
    }

    /// Channels passed to rattler-build, in priority order
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// The rattler-build invocation for `package`
    pub fn command(&self, package: &ScheduledPackage) -> ToolCommand {
        let mut args: Vec<OsString> = vec![
            "build".into(),
            "--experimental".into(),
            "--no-build-id".into(),
            "-r".into(),
            package.recipe_dir.clone().into(),
            "--output-dir".into(),
            self.layout.forge_dir().into(),
        ];
        for channel in &self.channels {
            args.push("-c".into());
            args.push(channel.into());
        }
        ToolCommand::new("rattler-build").args(args)
    }
}

impl PackageBuilder for RattlerBuilder {
    async fn build(&self, package: &ScheduledPackage) -> Result<(), ForgeError> {
        filesystem::remove_dir_all(&self.layout.package_work_dir(&package.name))?;
        self.command(package).status().await?;
        Ok(())
    }
}
