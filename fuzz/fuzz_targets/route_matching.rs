#![no_main]

use ferrous_host::{Method, Router};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };

    let mut router = Router::new();
    let patterns = [
        "/items/{id:int}",
        "/items/{id:uuid}/tags/{tag:alpha}",
        "/files/{name:alnum}",
        "/{section}/{page}",
    ];
    for pattern in patterns {
        if router.add_route(Method::GET, pattern, |_| Ok(String::new())).is_err() {
            return;
        }
    }

    if let Some(found) = router.match_route(&Method::GET, path) {
        for param in found.route.params() {
            assert!(found.params.contains_key(&param.name));
        }
    }
});
