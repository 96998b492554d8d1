/// Application name
pub const APP_NAME: &str = "DreamLayout";

/// Fixed prefix of every generated design code (`DL-XXXXX`)
pub const DESIGN_CODE_PREFIX: &str = "DL";

/// Number of random characters after the design code prefix
pub const DESIGN_CODE_SUFFIX_LEN: usize = 5;

/// Days a soft-deleted project survives before the archive reaper purges it
pub const ARCHIVE_RETENTION_DAYS: i64 = 5;

/// Width of the sketch canvas the boundary points are drawn on
pub const CANVAS_WIDTH: u32 = 800;

/// Height of the sketch canvas the boundary points are drawn on
pub const CANVAS_HEIGHT: u32 = 400;

/// Default number of projects shown on the owner dashboard
pub const DEFAULT_DASHBOARD_LIMIT: u32 = 6;

/// Default number of projects shown in the public gallery
pub const DEFAULT_PUBLIC_LIMIT: u32 = 24;

/// Root folder for mirrored project renderings in object storage
pub const MIRROR_ROOT_FOLDER: &str = "dreamlayout_projects";

/// Maximum number of title characters kept in a mirror slug
pub const MIRROR_SLUG_MAX_CHARS: usize = 30;
