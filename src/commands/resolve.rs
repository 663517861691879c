use crate::Context;
use crate::config::Config;
use crate::ui;
use anyhow::Result;
use ninjakit::{PlatformSignature, platform};

/// Show the download that applies to a platform.
pub fn run(ctx: &Context, id: &str, os_name: Option<String>, os_arch: Option<String>) -> Result<()> {
    let signature = signature(os_name, os_arch);
    let config = Config::load()?;
    let variant = config.client().resolve(id, &signature)?;

    if ctx.quiet {
        println!("{}", variant.url);
        return Ok(());
    }

    ui::header(&format!("Ninja {id}"));
    ui::kv("Platform", &signature.to_string());
    ui::kv(
        "OS family",
        &signature
            .family()
            .map_or_else(|| "unknown".to_string(), |family| family.to_string()),
    );
    ui::kv("Download", &variant.url);
    Ok(())
}

/// This machine's signature with the given overrides.
fn signature(os_name: Option<String>, os_arch: Option<String>) -> PlatformSignature {
    let detected = platform::detect();
    PlatformSignature::new(
        os_name.unwrap_or(detected.os_name),
        os_arch.unwrap_or(detected.os_arch),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_overrides() {
        let signature = signature(Some("Windows 10".to_string()), Some("x86".to_string()));
        assert_eq!(signature, PlatformSignature::new("Windows 10", "x86"));
    }

    #[test]
    fn test_signature_defaults_to_this_machine() {
        let detected = platform::detect();
        let signature = signature(None, Some("arm64".to_string()));
        assert_eq!(signature.os_name, detected.os_name);
        assert_eq!(signature.os_arch, "arm64");
    }
}
