//! Per-file transforms used by the packaging pipeline.
//!
//! - scripts: parsed with OXC (syntax errors abort), lowered to the ES5 target and minified
//!   with mangling + compression
//! - styles: minified with lightningcss
//! - configs: build-type exclusion regions stripped, then minified as JSON (comments and
//!   trailing commas tolerated, key order kept)

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_compat::EngineTargets;
use oxc_mangler::MangleOptions;
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use regex::Regex;
use std::path::Path;

use crate::config::{BuildType, PackageMetadata};
use crate::error::{BuildError, Step};

/// Syntax diagnostics for a script, empty when it parses cleanly.
pub fn script_diagnostics(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::default()).parse();
    let mut problems: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
    if parsed.panicked && problems.is_empty() {
        problems.push("parser gave up on this file".to_string());
    }
    problems
}

/// Language level every shipped script is compiled down to.
pub const SCRIPT_TARGET: &str = "es5";

/// Parses, compiles down to [`SCRIPT_TARGET`] and minifies one script.
pub fn minify_script(source: &str, path: &Path) -> Result<String, BuildError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::default()).parse();

    if let Some(first) = parsed.errors.first() {
        return Err(BuildError::step(Step::Script, path, first));
    }
    if parsed.panicked {
        return Err(BuildError::step(Step::Script, path, "unrecoverable parse error"));
    }

    let mut program = parsed.program;

    let transform_options = TransformOptions::from_target(SCRIPT_TARGET)
        .map_err(|e| BuildError::step(Step::Script, path, e))?;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let transformed = Transformer::new(&allocator, path, &transform_options)
        .build_with_scoping(scoping, &mut program);
    if let Some(first) = transformed.errors.first() {
        return Err(BuildError::step(Step::Script, path, first));
    }

    // The compressor must not reintroduce syntax the transformer just lowered.
    let target = EngineTargets::from_target(SCRIPT_TARGET)
        .map_err(|e| BuildError::step(Step::Script, path, e))?;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions {
            target,
            ..CompressOptions::smallest()
        }),
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minifies one stylesheet.
pub fn minify_style(source: &str, path: &Path) -> Result<String, BuildError> {
    let filename = path.to_string_lossy().into_owned();
    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| BuildError::step(Step::Style, path, e))?;

    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| BuildError::step(Step::Style, path, e))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| BuildError::step(Step::Style, path, e))?;
    Ok(printed.code)
}

/// Markers bounding a build-type-specific exclusion region.
pub fn exclusion_markers(build_type: BuildType) -> (String, String) {
    (
        format!("start-{build_type}-excludes"),
        format!("end-{build_type}-excludes"),
    )
}

/// Removes every region between the build type's start/end markers, markers included.
///
/// Markers may be written as `/* ... */`, `// ...` or `<!-- ... -->` comments.
pub fn strip_excludes(content: &str, build_type: BuildType) -> String {
    let (start, end) = exclusion_markers(build_type);
    let pattern = format!(
        r"[\t ]*(?:/\*|//|<!--)[\t ]*{start}[\t ]*(?:\*/|-->)?[\s\S]*?(?:/\*|//|<!--)[\t ]*{end}[\t ]*(?:\*/|-->)?[\t ]*\r?\n?",
        start = regex::escape(&start),
        end = regex::escape(&end),
    );
    // Both markers are escaped literals, so the pattern is always valid.
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(content, "").into_owned(),
        Err(_) => content.to_string(),
    }
}

/// Minifies JSON-like config content.
///
/// JSON5 covers comments and trailing commas; strict JSON that JSON5 rejects (integers
/// outside the `i64` range) is parsed again as plain JSON, keeping every digit.
pub fn minify_config(content: &str, path: &Path) -> Result<String, BuildError> {
    let value: serde_json::Value = match json5::from_str(content) {
        Ok(value) => value,
        Err(json5_err) => serde_json::from_str(content).map_err(|_| {
            BuildError::step(Step::Config, path, json5_err)
        })?,
    };
    serde_json::to_string(&value).map_err(|e| BuildError::step(Step::Config, path, e))
}

/// License/version banner prepended to every script and style artifact.
pub fn header(metadata: &PackageMetadata) -> String {
    [
        "/**".to_string(),
        format!(" * {} - {}", metadata.name, metadata.description),
        format!(" * @version v{}", metadata.version),
        format!(" * @license {}", metadata.license),
        format!(" * @author {}", metadata.author),
        " */".to_string(),
        String::new(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Author;

    const CONFIG: &str = r#"{
  "name": "timer",
  /* start-dev-excludes */
  "debug": true,
  /* end-dev-excludes */
  /* start-release-excludes */
  "internal": "only in dev",
  /* end-release-excludes */
  "version": "2"
}
"#;

    #[test]
    fn dev_build_strips_dev_region_only() {
        let stripped = strip_excludes(CONFIG, BuildType::Dev);
        assert!(!stripped.contains("\"debug\""));
        assert!(stripped.contains("\"internal\""));
        assert!(!stripped.contains("start-dev-excludes"));
        assert!(stripped.contains("start-release-excludes"));
    }

    #[test]
    fn release_build_strips_release_region_only() {
        let stripped = strip_excludes(CONFIG, BuildType::Release);
        assert!(stripped.contains("\"debug\""));
        assert!(!stripped.contains("\"internal\""));
    }

    #[test]
    fn line_comment_markers_are_supported() {
        let src = "{\n  \"a\": 1,\n  // start-custom-excludes\n  \"b\": 2,\n  // end-custom-excludes\n  \"c\": 3\n}\n";
        let stripped = strip_excludes(src, BuildType::Custom);
        assert!(!stripped.contains("\"b\""));
        assert!(stripped.contains("\"c\""));
    }

    #[test]
    fn content_without_markers_is_untouched() {
        let src = "{\"a\": 1}";
        assert_eq!(strip_excludes(src, BuildType::Release), src);
    }

    #[test]
    fn config_minify_drops_comments_and_keeps_key_order() {
        let stripped = strip_excludes(CONFIG, BuildType::Release);
        let minified = minify_config(&stripped, Path::new("skuid_timer.json")).unwrap();
        assert_eq!(minified, r#"{"name":"timer","debug":true,"version":"2"}"#);
    }

    #[test]
    fn config_minify_reports_invalid_json() {
        let err = minify_config("{ not json", Path::new("skuid_bad.json")).unwrap_err();
        assert!(matches!(
            err,
            BuildError::PipelineStep {
                step: Step::Config,
                ..
            }
        ));
    }

    #[test]
    fn script_minify_rejects_syntax_errors() {
        let err = minify_script("function (", Path::new("broken.js")).unwrap_err();
        assert!(matches!(
            err,
            BuildError::PipelineStep {
                step: Step::Script,
                ..
            }
        ));
        assert!(!script_diagnostics("function (").is_empty());
    }

    #[test]
    fn script_minify_shrinks_valid_source() {
        let src = "function add(first, second) {\n    // sum\n    return first + second;\n}\nconsole.log(add(1, 2));\n";
        let out = minify_script(src, Path::new("add.js")).unwrap();
        assert!(out.len() < src.len());
        assert!(!out.contains("// sum"));
        assert!(script_diagnostics(src).is_empty());
    }

    #[test]
    fn script_minify_lowers_es2015_plus_syntax() {
        let src = "var double = (a) => a * 2;\n\
                   var pick = function (o) { return o.limit ?? 10; };\n\
                   var power = function (n) { return n ** 2; };\n\
                   window.timer = { double: double, pick: pick, power: power };\n";
        let out = minify_script(src, Path::new("timer.js")).unwrap();
        assert!(!out.contains("=>"), "arrow function survived: {out}");
        assert!(!out.contains("??"), "nullish coalescing survived: {out}");
        assert!(!out.contains("**"), "exponentiation survived: {out}");
        assert!(out.contains("function"), "expected ES5 functions: {out}");
        assert!(script_diagnostics(&out).is_empty());
    }

    #[test]
    fn config_minify_keeps_integers_beyond_i64() {
        let out = minify_config(
            "{\"id\": 12345678901234567890, \"n\": 10}",
            Path::new("skuid_ids.json"),
        )
        .unwrap();
        assert_eq!(out, r#"{"id":12345678901234567890,"n":10}"#);

        let huge = minify_config(
            "{\"big\": 123456789012345678901234567890}",
            Path::new("skuid_ids.json"),
        )
        .unwrap();
        assert_eq!(huge, r#"{"big":123456789012345678901234567890}"#);
    }

    #[test]
    fn style_minify_shrinks_valid_source() {
        let src = ".timer {\n    color: #ff0000;\n    margin: 0px;\n}\n";
        let out = minify_style(src, Path::new("timer.css")).unwrap();
        assert!(out.len() < src.len());
        assert!(out.starts_with(".timer{"));
    }

    #[test]
    fn header_renders_package_metadata() {
        let metadata = PackageMetadata {
            name: "company-components".into(),
            description: "Custom components".into(),
            version: "1.2.3".into(),
            license: "MIT".into(),
            author: Author::Name("Jane Doe".into()),
        };
        let banner = header(&metadata);
        assert_eq!(
            banner,
            "/**\n * company-components - Custom components\n * @version v1.2.3\n * @license MIT\n * @author Jane Doe\n */\n"
        );
    }
}
