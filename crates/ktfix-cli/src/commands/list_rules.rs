//! List rules command implementation.

use ktfix::rules::Preset;
use ktfix::{Enablement, KtFix};
use std::fmt::Write as _;

/// Renders the rules, presets and properties of the standard engine.
#[must_use]
pub fn render() -> String {
    let engine = KtFix::standard().build();
    let mut out = String::new();

    let _ = writeln!(out, "Available rules:\n");
    let _ = writeln!(out, "{:<40} {:<13} Description", "Id", "Default");
    let _ = writeln!(out, "{}", "-".repeat(90));

    let mut providers: Vec<_> = engine.registry().providers().iter().collect();
    providers.sort_by(|a, b| a.id().cmp(b.id()));
    for provider in providers {
        let descriptor = provider.descriptor();
        let enablement = match descriptor.enablement {
            Enablement::Enabled => "enabled",
            Enablement::Disabled => "disabled",
            Enablement::Experimental => "experimental",
        };
        let _ = writeln!(
            out,
            "{:<40} {:<13} {}",
            descriptor.id.as_str(),
            enablement,
            descriptor.description
        );
    }

    let _ = writeln!(out, "\nPresets:");
    for (name, preset) in [("recommended", Preset::Recommended), ("all", Preset::All)] {
        let ids: Vec<String> = preset.providers().iter().map(|p| p.id().rule().to_string()).collect();
        let _ = writeln!(out, "  {name:<12} - {}", ids.join(", "));
    }

    let _ = writeln!(out, "\nProperties:");
    for property in engine.properties() {
        let _ = writeln!(
            out,
            "  {:<45} {} (default: {})",
            property.name, property.description, property.default
        );
    }

    let _ = writeln!(out, "\nEnable or disable a rule with a property, e.g.:");
    let _ = writeln!(out, "  ktfix lint -P ktfix_standard_max-line-length=disabled");
    out
}
