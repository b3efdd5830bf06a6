/// Environment variable pointing at a system-wide Oracle client installation.
pub const ORACLE_HOME_ENV: &str = "ORACLE_HOME";

/// Environment variable used as the default project root.
pub const ROOT_ENV: &str = "INDIGO_ROOT";

/// Top-level directory holding one workspace per build matrix point.
pub const BUILD_DIR: &str = "build";

/// Top-level directory holding the final release archives.
pub const DIST_DIR: &str = "dist";

/// Marker the build tool appends to archive names for shared-library packages.
pub const SHARED_SUFFIX: &str = "-shared";

pub const ARCHIVE_EXTENSION: &str = "zip";

/// File extensions that must carry the executable bit inside release archives.
pub const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bat"];

/// Returned by the version resolver when no declaration could be found.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Shared-library assembly shipped with the SQL Server package.
pub const SQLSERVER_ASSEMBLY: &str = "bingo-sqlserver.dll";
