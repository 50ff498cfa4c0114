//! Browser-side runtime and static pages served by the dispatch loop.

use crate::context::escape_html;

/// Script embedded in every page head.
///
/// Provides `__pw_call`, `__pw_send` and `__pw_submit`, applies patches with
/// all five swap modes, re-executes scripts found in swapped fragments,
/// subscribes to `/__sse`, and renders toasts.
pub const RUNTIME_JS: &str = r#"(function () {
  "use strict";

  function runScripts(root) {
    root.querySelectorAll("script").forEach(function (old) {
      var fresh = document.createElement("script");
      for (var i = 0; i < old.attributes.length; i++) {
        fresh.setAttribute(old.attributes[i].name, old.attributes[i].value);
      }
      fresh.textContent = old.textContent;
      old.replaceWith(fresh);
    });
  }

  function fragment(html) {
    var parsed = new DOMParser().parseFromString(html, "text/html");
    var nodes = [];
    parsed.head.childNodes.forEach(function (node) { nodes.push(node); });
    parsed.body.childNodes.forEach(function (node) { nodes.push(node); });
    var holder = document.createElement("template");
    nodes.forEach(function (node) { holder.content.appendChild(document.importNode(node, true)); });
    return holder.content;
  }

  function settle(el) {
    if (!el) { return; }
    el.classList.remove("pw-skeleton");
    el.removeAttribute("aria-busy");
  }

  function apply(swap, id, html) {
    if (swap === "none" || !id) { runScripts(document.body.appendChild(wrap(html))); return; }
    var el = document.getElementById(id);
    if (!el) { return; }
    var content = fragment(html);
    var wrapper = document.createElement("div");
    wrapper.appendChild(content);
    runScripts(wrapper);
    var nodes = Array.prototype.slice.call(wrapper.childNodes);
    if (swap === "outline") {
      el.replaceWith.apply(el, nodes);
      settle(document.getElementById(id));
    } else if (swap === "append") {
      nodes.forEach(function (node) { el.appendChild(node); });
    } else if (swap === "prepend") {
      nodes.reverse().forEach(function (node) { el.insertBefore(node, el.firstChild); });
    } else {
      el.replaceChildren.apply(el, nodes);
      settle(el);
    }
  }

  function wrap(html) {
    var holder = document.createElement("div");
    holder.style.display = "none";
    holder.appendChild(fragment(html));
    return holder;
  }

  function post(swap, id, path, values) {
    return fetch(path, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      credentials: "same-origin",
      body: JSON.stringify(values || [])
    }).then(function (response) {
      return response.text();
    }).then(function (html) {
      apply(swap, id, html);
    }).catch(function (error) {
      console.error("patchwire:", error);
    });
  }

  function fieldType(el) {
    if (el.type === "checkbox") { return "checkbox"; }
    if (el.type === "number" || el.type === "range") { return "int"; }
    if (el.type === "date" || el.type === "time" || el.type === "datetime-local") { return el.type; }
    return "string";
  }

  function collect(form, seeded) {
    var merged = {};
    var order = [];
    function put(item) {
      if (!(item.name in merged)) { order.push(item.name); }
      merged[item.name] = item;
    }
    (seeded || []).forEach(put);
    if (form) {
      Array.prototype.forEach.call(form.elements, function (el) {
        if (!el.name || el.disabled) { return; }
        if (el.type === "radio" && !el.checked) { return; }
        var value = el.type === "checkbox" ? String(el.checked) : el.value;
        if (el.type === "number" && el.value.indexOf(".") >= 0) {
          put({ name: el.name, type: "float64", value: value });
          return;
        }
        put({ name: el.name, type: fieldType(el), value: value });
      });
    }
    return order.map(function (name) { return merged[name]; });
  }

  window.__pw_call = function (event, swap, id, path, values) {
    if (event && event.preventDefault) { event.preventDefault(); }
    return post(swap, id, path, values);
  };

  window.__pw_send = function (swap, id, path, values) {
    return post(swap, id, path, values);
  };

  window.__pw_submit = function (event, swap, id, path, values) {
    if (event && event.preventDefault) { event.preventDefault(); }
    var source = event && (event.currentTarget || event.target);
    var form = source && (source.tagName === "FORM" ? source : source.form || source.closest("form"));
    return post(swap, id, path, collect(form, values));
  };

  window.__pw_toast = function (kind, message) {
    var box = document.getElementById("__pw_toasts");
    if (!box) {
      box = document.createElement("div");
      box.id = "__pw_toasts";
      document.body.appendChild(box);
    }
    var toast = document.createElement("div");
    toast.className = "pw-toast pw-toast-" + kind;
    toast.textContent = message;
    box.appendChild(toast);
    setTimeout(function () { toast.remove(); }, 5000);
  };

  function connect() {
    var source = new EventSource("/__sse");
    source.addEventListener("patch", function (event) {
      var message = JSON.parse(event.data);
      apply(message.swap, message.id, message.html);
    });
    source.onerror = function () {
      source.close();
      setTimeout(connect, 1000);
    };
  }

  document.addEventListener("DOMContentLoaded", connect);
})();
"#;

/// Reload watcher: reconnecting to `/__live` after a drop means the server
/// restarted, so the page is reloaded.
pub const LIVE_RELOAD_JS: &str = r#"(function () {
  var dropped = false;
  var source = new EventSource("/__live");
  source.onopen = function () { if (dropped) { location.reload(); } };
  source.onerror = function () { dropped = true; };
})();
"#;

/// Styles for toasts and skeleton placeholders.
pub const RUNTIME_CSS: &str = r#"#__pw_toasts{position:fixed;top:1rem;right:1rem;display:flex;flex-direction:column;gap:.5rem;z-index:9999}
.pw-toast{padding:.75rem 1rem;border-radius:.375rem;color:#fff;font:14px sans-serif;box-shadow:0 2px 6px rgba(0,0,0,.2)}
.pw-toast-success{background:#15803d}.pw-toast-error{background:#b91c1c}.pw-toast-info{background:#1d4ed8}
.pw-skeleton .pw-skel{background:#e5e7eb;border-radius:.25rem;margin:.5rem 0;animation:pw-pulse 1.5s ease-in-out infinite}
.pw-skel-line{height:1rem}.pw-skel-title{height:1.75rem;width:40%}.pw-skel-block{height:6rem}
.pw-skel-input{height:2.25rem}.pw-skel-short{width:60%}
@keyframes pw-pulse{50%{opacity:.5}}
"#;

/// Static page returned when a handler fails. Retries the page once the
/// server answers again.
pub const ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Something went wrong</title></head>
<body style="font-family:sans-serif;text-align:center;padding:4rem">
<h1>Something went wrong</h1>
<p>The page will try to reconnect shortly.</p>
<script>
(function () {
  function retry() {
    fetch(location.href, { cache: "no-store" })
      .then(function (response) { if (response.ok) { location.reload(); } else { setTimeout(retry, 3000); } })
      .catch(function () { setTimeout(retry, 3000); });
  }
  setTimeout(retry, 3000);
})();
</script>
</body>
</html>
"#;

/// Body returned for unknown routes.
pub const NOT_FOUND_BODY: &str = "Not found";

/// Wraps a page fragment into a complete HTML document.
#[must_use]
pub fn document(title: &str, head: &str, body: &str, live_reload: bool) -> String {
    let live = if live_reload {
        format!("<script>{LIVE_RELOAD_JS}</script>")
    } else {
        String::new()
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{RUNTIME_CSS}</style>\n<script>{RUNTIME_JS}</script>\n\
         {live}{head}\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_embed_the_runtime_and_body() {
        let page = document("Counter <1>", "", "<div id=\"t-1\">0</div>", false);

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Counter &lt;1&gt;</title>"));
        assert!(page.contains("window.__pw_call"));
        assert!(page.contains("<div id=\"t-1\">0</div>"));
        assert!(!page.contains("/__live"));
    }

    #[test]
    fn live_reload_script_is_optional() {
        let page = document("", "", "", true);
        assert!(page.contains("new EventSource(\"/__live\")"));
    }

    #[test]
    fn error_page_retries() {
        assert!(ERROR_PAGE.contains("Something went wrong"));
        assert!(ERROR_PAGE.contains("location.reload()"));
    }
}
