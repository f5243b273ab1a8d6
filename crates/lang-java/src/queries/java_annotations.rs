beanscope_plugin::decl_indices!(AnnotationIndices, {
    package => "package",
    import => "import",
    annotation => "annotation",
    name => "annotation.name",
});

pub const JAVA_ANNOTATIONS_SCM: &str = include_str!("java_annotations.scm");
