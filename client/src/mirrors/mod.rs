mod value_mirror;

pub use value_mirror::ValueMirror;
