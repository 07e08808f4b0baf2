mod paths;

pub use paths::{APP_DIR_NAME, AppPaths, AppPathsError};
