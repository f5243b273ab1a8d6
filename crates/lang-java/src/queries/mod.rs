pub mod java_annotations;
