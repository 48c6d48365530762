pub mod model_loaders;

pub use model_loaders::{
    load_comment_middleware, load_issue_middleware, load_project_middleware,
};
