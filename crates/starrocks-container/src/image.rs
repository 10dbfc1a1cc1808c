//! Derived StarRocks image
//!
//! The all-in-one image starts FE and BE with its own entrypoint. The e2e
//! suites need `start_fe_be.sh` baked in, so a container of the base image is
//! started once, the script is copied in, and the container is committed.

use crate::{Result, StarRocksError};
use docker_runtime::{ContainerId, ContainerRuntime, ImageRef, RunSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const STAR_ROCKS_IMAGE_NAME: &str = "starrocks/allin1-ubi:3.0.4";
pub const NEW_STARROCKS_REPOSITORY: &str = "inlong-starrocks";
pub const NEW_STARROCKS_TAG: &str = "latest";
pub const STARTUP_SCRIPT_PATH: &str = "/data/deploy/start_fe_be.sh";

const BUILDER_CONTAINER_NAME: &str = "inlong-starrocks-builder";
const SCRIPT_RELATIVE_PATH: &str = "docker/starrocks/start_fe_be.sh";

pub fn new_starrocks_image() -> ImageRef {
    ImageRef::new(NEW_STARROCKS_REPOSITORY, NEW_STARROCKS_TAG)
}

/// `inlong-starrocks:latest`
pub fn new_starrocks_image_name() -> String {
    new_starrocks_image().to_string()
}

/// Commits a copy of the base image with `script` installed as the startup script.
///
/// A failure to mark the script executable is logged and ignored. The source
/// container is stopped and removed whether or not the commit succeeds.
pub fn build_starrocks_image(runtime: &dyn ContainerRuntime, script: &Path) -> Result<ImageRef> {
    if !script.is_file() {
        return Err(StarRocksError::ScriptNotFound(script.to_path_buf()));
    }
    info!("Building {} from {}", new_starrocks_image(), STAR_ROCKS_IMAGE_NAME);

    let mut spec = RunSpec::new(STAR_ROCKS_IMAGE_NAME);
    spec.name = Some(BUILDER_CONTAINER_NAME.to_string());
    if let Err(e) = runtime.remove(BUILDER_CONTAINER_NAME) {
        debug!("No stale builder container removed: {}", e);
    }
    let id = runtime.run(&spec)?;

    let result = install_and_commit(runtime, &id, script);

    if let Err(e) = runtime.stop(&id) {
        warn!("Failed to stop builder container {}: {}", id, e);
    }
    if let Err(e) = runtime.remove(id.as_str()) {
        debug!("Failed to remove builder container {}: {}", id, e);
    }
    result
}

fn install_and_commit(
    runtime: &dyn ContainerRuntime,
    id: &ContainerId,
    script: &Path,
) -> Result<ImageRef> {
    runtime.copy_into(id, script, STARTUP_SCRIPT_PATH)?;
    make_executable(runtime, id);

    let image = new_starrocks_image();
    runtime.commit(id, &image)?;
    info!("Committed image {}", image);
    Ok(image)
}

/// `chmod +x` the startup script; never fails.
fn make_executable(runtime: &dyn ContainerRuntime, id: &ContainerId) {
    match runtime.exec(id, &["chmod", "+x", STARTUP_SCRIPT_PATH]) {
        Ok(output) if output.success() => debug!("Marked {} executable", STARTUP_SCRIPT_PATH),
        Ok(output) => warn!(
            "chmod of {} exited with {}: {}",
            STARTUP_SCRIPT_PATH,
            output.exit_code,
            output.stderr.trim()
        ),
        Err(e) => warn!("chmod of {} failed: {}", STARTUP_SCRIPT_PATH, e),
    }
}

/// Finds `docker/starrocks/start_fe_be.sh` in the current directory or an ancestor.
pub fn find_startup_script() -> Result<PathBuf> {
    let mut current_dir = std::env::current_dir().map_err(docker_runtime::RuntimeError::from)?;
    loop {
        let candidate = current_dir.join(SCRIPT_RELATIVE_PATH);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current_dir.pop() {
            return Err(StarRocksError::ScriptNotFound(PathBuf::from(
                SCRIPT_RELATIVE_PATH,
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docker_runtime::testing::{Call, RecordingRuntime};

    fn script() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "#!/bin/bash\n").unwrap();
        file
    }

    fn commits(runtime: &RecordingRuntime) -> Vec<ImageRef> {
        runtime
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Commit { image, .. } => Some(image),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_image_name() {
        assert_eq!(new_starrocks_image_name(), "inlong-starrocks:latest");
    }

    #[test]
    fn test_build_sequence() {
        let runtime = RecordingRuntime::new();
        let script = script();

        let image = build_starrocks_image(&runtime, script.path()).unwrap();
        assert_eq!(image, new_starrocks_image());

        let id = ContainerId::new("fake-1");
        let calls = runtime.calls();
        assert_eq!(calls[0], Call::Remove(BUILDER_CONTAINER_NAME.to_string()));
        assert!(matches!(&calls[1], Call::Run(spec) if spec.image == STAR_ROCKS_IMAGE_NAME));
        assert_eq!(
            calls[2..],
            [
                Call::CopyInto {
                    id: id.clone(),
                    source: script.path().to_path_buf(),
                    destination: STARTUP_SCRIPT_PATH.to_string(),
                },
                Call::Exec {
                    id: id.clone(),
                    command: vec![
                        "chmod".to_string(),
                        "+x".to_string(),
                        STARTUP_SCRIPT_PATH.to_string()
                    ],
                },
                Call::Commit {
                    id: id.clone(),
                    image: new_starrocks_image(),
                },
                Call::Stop(id.clone()),
                Call::Remove(id.as_str().to_string()),
            ]
        );
    }

    #[test]
    fn test_chmod_failure_still_commits() {
        let runtime = RecordingRuntime::new().with_failing_exec();
        let script = script();

        let image = build_starrocks_image(&runtime, script.path()).unwrap();

        assert_eq!(image.to_string(), "inlong-starrocks:latest");
        assert_eq!(commits(&runtime), vec![new_starrocks_image()]);
    }

    #[test]
    fn test_commit_failure_still_stops_container() {
        let runtime = RecordingRuntime::new().with_failing_commit();
        let script = script();

        let err = build_starrocks_image(&runtime, script.path()).unwrap_err();
        assert!(matches!(err, StarRocksError::Runtime(_)), "{err:?}");
        assert!(runtime
            .calls()
            .contains(&Call::Stop(ContainerId::new("fake-1"))));
    }

    #[test]
    fn test_missing_script_starts_nothing() {
        let runtime = RecordingRuntime::new();
        let err =
            build_starrocks_image(&runtime, Path::new("/nonexistent/start_fe_be.sh")).unwrap_err();

        assert!(matches!(err, StarRocksError::ScriptNotFound(_)));
        assert!(runtime.calls().is_empty());
    }
}
