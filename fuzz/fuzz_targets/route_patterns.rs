#![no_main]

use ferrous_host::{Context, HandlerResult, Method, Route, RouteHandler};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

// Arbitrary patterns must compile or fail with an error, never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(pattern) = std::str::from_utf8(data) else {
        return;
    };
    let handler: RouteHandler = Arc::new(|_: &mut Context| -> HandlerResult<String> { Ok(String::new()) });
    if let Ok(route) = Route::new(Method::GET, pattern, handler) {
        let _ = route.match_path(route.pattern());
        let _ = route.params().len();
    }
});
