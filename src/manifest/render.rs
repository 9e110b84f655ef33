// src/manifest/render.rs

//! Text rendering for the offline bundle files
//!
//! Everything here is a pure function of a [`Manifest`]: no filesystem, no
//! clock, so identical manifests render to identical bytes.

use crate::error::{Error, Result};
use handlebars::Handlebars;
use serde_json::json;

use super::Manifest;

const INSTALL_SH: &str = "\
#!/bin/sh
# Generated by wheelhouse. Installs the bundled wheels without network access.
{{#each artifacts}}#   {{name}}=={{version}}
{{/each}}cd \"$(dirname \"$0\")\" || exit 1

{{#if conda}}echo \"Creating conda environment {{env_name}} (python {{python_version}})\"
conda create -y -n {{env_name}} python={{python_version}} || exit 1
eval \"$(conda shell.posix hook)\" 2>/dev/null
conda activate {{env_name}} || . activate {{env_name}} || exit 1

{{/if}}failed=0
for wheel in \"{{wheel_dir}}\"/*.whl; do
    [ -e \"$wheel\" ] || continue
    if ! python -m pip install --no-index --no-deps \"$wheel\"; then
        echo \"Failed to install $wheel\" >&2
        failed=$((failed + 1))
    fi
done

if [ \"$failed\" -gt 0 ]; then
    echo \"$failed wheel(s) failed to install\" >&2
    exit 1
fi
";

const INSTALL_BAT: &str = "\
@echo off
rem Generated by wheelhouse. Installs the bundled wheels without network access.
{{#each artifacts}}rem   {{name}}=={{version}}
{{/each}}cd /d \"%~dp0\"

{{#if conda}}echo Creating conda environment {{env_name}} (python {{python_version}})
call conda create -y -n {{env_name}} python={{python_version}}
if errorlevel 1 exit /b 1
call conda activate {{env_name}}
if errorlevel 1 exit /b 1

{{/if}}set FAILED=0
for %%W in (\"{{wheel_dir}}\\*.whl\") do (
    python -m pip install --no-index --no-deps \"%%~fW\"
    if errorlevel 1 (
        echo Failed to install %%~nxW
        set /a FAILED+=1
    )
)

if %FAILED% gtr 0 (
    echo %FAILED% wheel^(s^) failed to install
    exit /b 1
)
";

/// Renders the install scripts from a manifest
pub struct ScriptRenderer {
    engine: Handlebars<'static>,
}

impl ScriptRenderer {
    pub fn new() -> Result<Self> {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(false);
        engine.register_escape_fn(handlebars::no_escape);
        engine
            .register_template_string("install.sh", INSTALL_SH)
            .map_err(|e| Error::TemplateError(format!("install.sh: {e}")))?;
        engine
            .register_template_string("install.bat", INSTALL_BAT)
            .map_err(|e| Error::TemplateError(format!("install.bat: {e}")))?;
        Ok(Self { engine })
    }

    /// POSIX shell installer, LF line endings
    pub fn render_sh(&self, manifest: &Manifest) -> Result<String> {
        self.render("install.sh", manifest, manifest.wheel_dir.replace('\\', "/"))
    }

    /// Windows batch installer, CRLF line endings
    pub fn render_bat(&self, manifest: &Manifest) -> Result<String> {
        let text = self.render("install.bat", manifest, manifest.wheel_dir.replace('/', "\\"))?;
        Ok(text.replace('\n', "\r\n"))
    }

    fn render(&self, template: &str, manifest: &Manifest, wheel_dir: String) -> Result<String> {
        let context = json!({
            "wheel_dir": wheel_dir,
            "conda": manifest.conda_enabled(),
            "env_name": manifest.env_name,
            "python_version": manifest.python_version,
            "artifacts": manifest.artifacts,
        });
        self.engine
            .render(template, &context)
            .map_err(|e| Error::TemplateError(format!("Failed to render {template}: {e}")))
    }
}

/// One `name==version` line per artifact, in manifest order
pub fn render_requirements(manifest: &Manifest) -> String {
    manifest
        .artifacts
        .iter()
        .map(|entry| format!("{}=={}\n", entry.name, entry.version))
        .collect()
}

/// Pretty JSON with a trailing newline
pub fn render_json(manifest: &Manifest) -> Result<String> {
    let mut text = serde_json::to_string_pretty(manifest)?;
    text.push('\n');
    Ok(text)
}
