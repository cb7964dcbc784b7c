pub mod apply;
pub mod error;
pub mod patch_op;
