//! Lowers a scanned CHTL-JS segment list into plain JavaScript text
//! (spec §4.7 "Lowering rules").

use super::ast::{Entry, Segment};
use crate::cjmod::builtin::chtholly;
use crate::error::Result;
use std::fmt::Write as _;

pub fn lower(segments: &[Segment]) -> Result<String> {
    let mut out = String::new();
    for segment in segments {
        lower_segment(segment, &mut out)?;
    }
    Ok(out)
}

fn lower_segment(segment: &Segment, out: &mut String) -> Result<()> {
    match segment {
        Segment::Raw(text) => out.push_str(text),
        Segment::EnhancedSelector { selector, index } => {
            out.push_str(&super::lexer::lower_selector(selector, index.as_deref()));
        }
        Segment::Listen { target, entries } => {
            for entry in entries {
                let _ = writeln!(out, "{target}.addEventListener('{}', {});", entry.key, entry.value);
            }
        }
        Segment::Delegate { parent, entries } => {
            let target_selector = entries
                .iter()
                .find(|e| e.key == "target")
                .map(|e| e.value.trim_matches(|c| c == '"' || c == '\'').to_string())
                .unwrap_or_default();
            for entry in entries.iter().filter(|e| e.key != "target") {
                let _ = writeln!(
                    out,
                    "{parent}.addEventListener('{}', function(event) {{ if (event.target.matches('{target_selector}')) ({})(event); }});",
                    entry.key, entry.value
                );
            }
        }
        Segment::Animate { entries } => lower_animate(entries, out),
        Segment::Router { entries } => lower_router(entries, out),
        Segment::Vir { name, entries } => lower_vir(name, entries, out),
        Segment::FileLoader { entries } => lower_fileloader(entries, out),
        Segment::Util { condition, change, then } => {
            let _ = write!(out, "if ({condition}) {{ {change} }} else {{ {then} }}");
        }
        Segment::INeverAway { entries } => out.push_str(&chtholly::i_never_away(entries)),
        Segment::PrintMylove { args } => out.push_str(&chtholly::print_mylove(args)),
    }
    Ok(())
}

fn find<'a>(entries: &'a [Entry], key: &str) -> Option<&'a str> {
    entries.iter().find(|e| e.key == key).map(|e| e.value.as_str())
}

/// Lowers `animate { ... }` to a self-contained `requestAnimationFrame`
/// driver (spec §4.7): applies `begin`, interpolates numeric style
/// properties across the `when[]` keyframes in offset order, applies `end`,
/// and optionally loops. Inlined per call site rather than referencing a
/// shared runtime helper, since nothing downstream (the merger, the output
/// stage) currently has a place to hang one artifact-wide JS preamble.
fn lower_animate(entries: &[Entry], out: &mut String) {
    let target = find(entries, "target").unwrap_or("null");
    let duration = find(entries, "duration").unwrap_or("300");
    let begin = find(entries, "begin").unwrap_or("{}");
    let when = find(entries, "when").unwrap_or("[]");
    let end = find(entries, "end").unwrap_or("{}");
    let loop_flag = find(entries, "loop").unwrap_or("false");
    let direction = find(entries, "direction").unwrap_or("'normal'");
    let delay = find(entries, "delay").unwrap_or("0");
    let callback = find(entries, "callback").unwrap_or("function(){}");

    out.push_str("(function() {\n");
    let _ = writeln!(out, "  const __target = {target};");
    let _ = writeln!(out, "  const __dur = {duration};");
    let _ = writeln!(out, "  const __begin = {begin};");
    let _ = writeln!(out, "  const __when = {when};");
    let _ = writeln!(out, "  const __end = {end};");
    let _ = writeln!(out, "  const __loop = {loop_flag};");
    let _ = writeln!(out, "  const __direction = {direction};");
    let _ = writeln!(out, "  const __delay = {delay};");
    let _ = writeln!(out, "  const __callback = {callback};");
    out.push_str(
        r#"  const __applyProps = function(el, props) {
    for (const k in props) {
      el.style[k] = typeof props[k] === 'number' ? props[k] + 'px' : props[k];
    }
  };
  const __lerp = function(a, b, t) { return a + (b - a) * t; };
  const __interpolate = function(from, to, t) {
    const out = {};
    for (const k in to) {
      const a = from[k]; const b = to[k];
      out[k] = (typeof a === 'number' && typeof b === 'number') ? __lerp(a, b, t) : (t < 1 ? a : b);
    }
    return out;
  };
  const __keyframes = [{ offset: 0, props: __begin }]
    .concat(__when.map(function(k) { return { offset: k.offset != null ? k.offset : 0.5, props: k }; }))
    .concat([{ offset: 1, props: __end }])
    .sort(function(a, b) { return a.offset - b.offset; });
  const __run = function(__startTime) {
    const __tick = function(__now) {
      const __elapsed = __now - __startTime - __delay;
      if (__elapsed < 0) { requestAnimationFrame(__tick); return; }
      let __t = Math.min(__elapsed / __dur, 1);
      if (__direction === 'reverse') { __t = 1 - __t; }
      let __from = __keyframes[0];
      let __to = __keyframes[__keyframes.length - 1];
      for (let i = 0; i < __keyframes.length - 1; i++) {
        if (__t >= __keyframes[i].offset && __t <= __keyframes[i + 1].offset) {
          __from = __keyframes[i]; __to = __keyframes[i + 1]; break;
        }
      }
      const __span = Math.max(__to.offset - __from.offset, 0.0001);
      const __localT = Math.min(Math.max((__t - __from.offset) / __span, 0), 1);
      __applyProps(__target, __interpolate(__from.props, __to.props, __localT));
      if (__elapsed < __dur) {
        requestAnimationFrame(__tick);
      } else if (__loop) {
        __run(__now);
      } else {
        __callback();
      }
    };
    requestAnimationFrame(__tick);
  };
  __run(performance.now());
"#,
    );
    out.push_str("})();");
}

fn lower_router(entries: &[Entry], out: &mut String) {
    out.push_str("(function() { const __router = { routes: {}, mode: 'hash',\n");
    out.push_str("  addRoute: function(path, page) { this.routes[path] = page; },\n");
    out.push_str("  navigate: function(path) { if (this.mode === 'hash') { location.hash = path; } else { history.pushState({}, '', path); this.dispatch(path); } },\n");
    out.push_str("  dispatch: function(path) { const page = this.routes[path]; if (typeof page === 'function') page(); },\n");
    out.push_str("};\n");
    for entry in entries {
        let path = entry.key.trim_matches(|c| c == '"' || c == '\'');
        let _ = writeln!(out, "__router.addRoute('{path}', {});", entry.value);
    }
    out.push_str("window.addEventListener('hashchange', function() { __router.dispatch(location.hash.slice(1)); });\n");
    out.push_str("window.addEventListener('popstate', function() { __router.dispatch(location.pathname); });\n");
    out.push_str("return __router; })();");
}

fn lower_vir(name: &str, entries: &[Entry], out: &mut String) {
    let _ = writeln!(out, "const {name} = {{");
    for entry in entries {
        let _ = writeln!(out, "  {}: {},", entry.key, entry.value);
    }
    out.push_str("};\n");
    let _ = writeln!(
        out,
        "{name}.__isVirtualObject = true; {name}.__keys = function() {{ return Object.keys({name}).filter(function(k) {{ return !k.startsWith('__'); }}); }};"
    );
}

fn lower_fileloader(entries: &[Entry], out: &mut String) {
    let load = find(entries, "load").unwrap_or("''");
    out.push_str("(function() {\n");
    let _ = writeln!(out, "  const __script = document.createElement('script');\n  __script.src = {load};");
    if let Some(on_load) = find(entries, "onload") {
        let _ = writeln!(out, "  __script.onload = {on_load};");
    }
    if let Some(on_error) = find(entries, "onerror") {
        let _ = writeln!(out, "  __script.onerror = {on_error};");
    }
    out.push_str("  document.head.appendChild(__script);\n})();");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chtl_js::lexer::scan;

    #[test]
    fn lowers_listen_after_enhanced_selector() {
        let segs = scan("{{#b}}->listen { click: () => x() }").unwrap();
        let js = lower(&segs).unwrap();
        assert_eq!(js.trim(), "document.getElementById('b').addEventListener('click', () => x());");
    }

    #[test]
    fn lowers_util_to_if_else() {
        let segs = scan("util a > 1 -> change { y = 1; } -> then { y = 2; }").unwrap();
        let js = lower(&segs).unwrap();
        assert_eq!(js, "if (a > 1) { y = 1; } else { y = 2; }");
    }

    #[test]
    fn lowers_vir_to_plain_object() {
        let segs = scan("vir Counter = { count: 0 }").unwrap();
        let js = lower(&segs).unwrap();
        assert!(js.contains("const Counter = {"));
        assert!(js.contains("count: 0,"));
        assert!(js.contains("__isVirtualObject = true"));
    }

    #[test]
    fn animate_lowers_to_a_runnable_request_animation_frame_driver() {
        let segs = scan("animate { target: box, duration: 500, begin: { opacity: 0 }, end: { opacity: 1 } }").unwrap();
        let js = lower(&segs).unwrap();
        assert!(!js.contains("__chtlAnimate"), "must not reference an undefined runtime helper");
        assert!(js.contains("requestAnimationFrame"));
        assert!(js.contains("const __begin = { opacity: 0 };"));
        assert!(js.contains("const __end = { opacity: 1 };"));
    }
}
