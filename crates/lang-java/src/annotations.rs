//! Fully-qualified names of the Spring annotations this crate indexes.

pub const COMPONENT: &str = "org.springframework.stereotype.Component";
pub const SERVICE: &str = "org.springframework.stereotype.Service";
pub const REPOSITORY: &str = "org.springframework.stereotype.Repository";
pub const CONTROLLER: &str = "org.springframework.stereotype.Controller";
pub const REST_CONTROLLER: &str = "org.springframework.web.bind.annotation.RestController";
pub const CONFIGURATION: &str = "org.springframework.context.annotation.Configuration";
pub const BEAN: &str = "org.springframework.context.annotation.Bean";
pub const SPRING_BOOT_CONFIGURATION: &str = "org.springframework.boot.SpringBootConfiguration";
pub const SPRING_BOOT_APPLICATION: &str = "org.springframework.boot.autoconfigure.SpringBootApplication";

pub const REQUEST_MAPPING: &str = "org.springframework.web.bind.annotation.RequestMapping";
pub const GET_MAPPING: &str = "org.springframework.web.bind.annotation.GetMapping";
pub const POST_MAPPING: &str = "org.springframework.web.bind.annotation.PostMapping";
pub const PUT_MAPPING: &str = "org.springframework.web.bind.annotation.PutMapping";
pub const DELETE_MAPPING: &str = "org.springframework.web.bind.annotation.DeleteMapping";
pub const PATCH_MAPPING: &str = "org.springframework.web.bind.annotation.PatchMapping";

pub const REQUEST_MAPPINGS: &[&str] = &[
    REQUEST_MAPPING,
    GET_MAPPING,
    POST_MAPPING,
    PUT_MAPPING,
    DELETE_MAPPING,
    PATCH_MAPPING,
];

pub const STEREOTYPES: &[&str] = &[
    COMPONENT,
    SERVICE,
    REPOSITORY,
    CONTROLLER,
    REST_CONTROLLER,
    CONFIGURATION,
    SPRING_BOOT_CONFIGURATION,
    SPRING_BOOT_APPLICATION,
];

/// Meta-annotations a stereotype carries, nearest first.
pub fn meta_annotations(fqn: &str) -> &'static [&'static str] {
    match fqn {
        SPRING_BOOT_APPLICATION => &[SPRING_BOOT_CONFIGURATION, CONFIGURATION, COMPONENT],
        SPRING_BOOT_CONFIGURATION => &[CONFIGURATION, COMPONENT],
        REST_CONTROLLER => &[CONTROLLER, COMPONENT],
        CONFIGURATION | SERVICE | REPOSITORY | CONTROLLER => &[COMPONENT],
        _ => &[],
    }
}

/// HTTP method implied by a shortcut mapping annotation.
pub fn implied_method(fqn: &str) -> Option<&'static str> {
    match fqn {
        GET_MAPPING => Some("GET"),
        POST_MAPPING => Some("POST"),
        PUT_MAPPING => Some("PUT"),
        DELETE_MAPPING => Some("DELETE"),
        PATCH_MAPPING => Some("PATCH"),
        _ => None,
    }
}

pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}
