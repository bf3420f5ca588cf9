//! sw.js 生成
//!
//! install / activate / fetch の3ハンドラを戦略ごとに出し分ける。

use super::{ServiceWorkerPlan, Strategy};

/// JS文字列リテラル用のエスケープ（JSONエンコードを流用）
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn fetch_handler(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::CacheFirst => {
            r#"self.addEventListener('fetch', (event) => {
  if (event.request.method !== 'GET') return;
  event.respondWith(
    caches.match(event.request).then((cached) =>
      cached || fetch(event.request).catch(() => offlineResponse())
    )
  );
});"#
        }
        Strategy::NetworkFirst => {
            r#"self.addEventListener('fetch', (event) => {
  if (event.request.method !== 'GET') return;
  event.respondWith(
    fetch(event.request)
      .then((response) => {
        if (response.ok) {
          const copy = response.clone();
          caches.open(CACHE_NAME).then((cache) => cache.put(event.request, copy));
        }
        return response;
      })
      .catch(() =>
        caches.match(event.request).then((cached) => cached || offlineResponse())
      )
  );
});"#
        }
        Strategy::StaleWhileRevalidate => {
            r#"self.addEventListener('fetch', (event) => {
  if (event.request.method !== 'GET') return;
  event.respondWith(
    caches.open(CACHE_NAME).then((cache) =>
      cache.match(event.request).then((cached) => {
        const network = fetch(event.request)
          .then((response) => {
            if (response.ok) cache.put(event.request, response.clone());
            return response;
          })
          .catch(() => null);
        return cached || network.then((response) => response || offlineResponse());
      })
    )
  );
});"#
        }
    }
}

/// プランから sw.js の内容を生成
pub fn render_sw_js(plan: &ServiceWorkerPlan) -> String {
    let assets: Vec<String> = plan.assets.iter().map(|a| format!("  {}", js_string(a))).collect();

    let offline = match &plan.offline_fallback {
        Some(url) => format!(
            "function offlineResponse() {{\n  return caches.match({}).then((r) => r || new Response('Offline', {{ status: 503, headers: {{ 'Content-Type': 'text/plain' }} }}));\n}}",
            js_string(url)
        ),
        None => "function offlineResponse() {\n  return new Response('Offline', { status: 503, headers: { 'Content-Type': 'text/plain' } });\n}".to_string(),
    };

    let mut js = String::new();
    js.push_str(&format!("// strategy: {}\n", plan.strategy));
    js.push_str(&format!("const CACHE_NAME = {};\n", js_string(&plan.cache_name)));
    js.push_str("const ASSETS = [\n");
    js.push_str(&assets.join(",\n"));
    js.push_str("\n];\n\n");
    js.push_str(&offline);
    js.push_str("\n\n");
    js.push_str(
        r#"self.addEventListener('install', (event) => {
  event.waitUntil(
    caches.open(CACHE_NAME).then((cache) => cache.addAll(ASSETS)).then(() => self.skipWaiting())
  );
});

self.addEventListener('activate', (event) => {
  event.waitUntil(
    caches
      .keys()
      .then((names) => Promise.all(names.filter((n) => n !== CACHE_NAME).map((n) => caches.delete(n))))
      .then(() => self.clients.claim())
  );
});

"#,
    );
    js.push_str(fetch_handler(plan.strategy));
    js.push('\n');
    js
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_assets_and_name() {
        let plan = ServiceWorkerPlan::new(
            "visite-v3",
            vec!["./index.html".to_string(), "./lib/jszip.min.js".to_string()],
            Strategy::CacheFirst,
        );
        let js = render_sw_js(&plan);

        assert!(js.contains(r#"const CACHE_NAME = "visite-v3";"#));
        assert!(js.contains(r#"  "./index.html","#));
        assert!(js.contains(r#"  "./lib/jszip.min.js""#));
        assert!(js.contains("cache.addAll(ASSETS)"));
        assert!(js.contains("n !== CACHE_NAME"));
        assert!(js.contains("self.clients.claim()"));
    }

    #[test]
    fn test_render_per_strategy() {
        let mut plan = ServiceWorkerPlan::new("c", vec![], Strategy::NetworkFirst);
        assert!(render_sw_js(&plan).contains(".catch(() =>\n        caches.match(event.request)"));

        plan.strategy = Strategy::StaleWhileRevalidate;
        assert!(render_sw_js(&plan).contains("return cached || network"));
    }

    #[test]
    fn test_render_escapes_quotes() {
        let plan = ServiceWorkerPlan::new("a\"b", vec!["x'y".to_string()], Strategy::CacheFirst);
        let js = render_sw_js(&plan);
        assert!(js.contains(r#"const CACHE_NAME = "a\"b";"#));
        assert!(js.contains(r#""x'y""#));
    }

    #[test]
    fn test_render_offline_fallback() {
        let mut plan = ServiceWorkerPlan::new("c", vec![], Strategy::CacheFirst);
        plan.offline_fallback = Some("./offline.html".to_string());
        assert!(render_sw_js(&plan).contains(r#"caches.match("./offline.html")"#));
    }
}
