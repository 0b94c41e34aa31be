//! Verify a Sigstore bundle offline
//!
//! ```sh
//! cargo run -p sigstore-verify --example verify_bundle -- \
//!     trusted_root.json artifact.sigstore.json [artifact.txt]
//! ```
//!
//! Pin the signer identity:
//! ```sh
//! cargo run -p sigstore-verify --example verify_bundle -- \
//!     --identity "^https://github.com/owner/repo/" \
//!     --issuer "https://token.actions.githubusercontent.com" \
//!     trusted_root.json artifact.sigstore.json artifact.txt
//! ```
//!
//! The artifact is only needed for message signature bundles; DSSE bundles
//! carry their payload.

use sigstore_verify::trust_root::{KeySource, TrustMaterial, TrustedRoot};
use sigstore_verify::types::Bundle;
use sigstore_verify::{VerificationPolicy, Verifier, VerifierOptions};

use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut policy = VerificationPolicy::default();
    let mut positional: Vec<String> = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--identity" | "-i" => match args.next() {
                Some(value) => policy = policy.require_identity(value),
                None => fail("--identity requires a value"),
            },
            "--issuer" | "-o" => match args.next() {
                Some(value) => policy = policy.require_issuer(value),
                None => fail("--issuer requires a value"),
            },
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => positional.push(arg),
        }
    }

    let (root_path, bundle_path, artifact_path) = match positional.as_slice() {
        [root, bundle] => (root, bundle, None),
        [root, bundle, artifact] => (root, bundle, Some(artifact)),
        _ => {
            print_usage();
            process::exit(1);
        }
    };

    let root = TrustedRoot::from_file(root_path)
        .unwrap_or_else(|e| fail(&format!("failed to load trusted root: {}", e)));
    let trust = TrustMaterial::from_trusted_root(&root, KeySource::default())
        .unwrap_or_else(|e| fail(&format!("unusable trusted root: {}", e)));

    let bundle_json = fs::read_to_string(bundle_path)
        .unwrap_or_else(|e| fail(&format!("failed to read bundle: {}", e)));
    let bundle = Bundle::from_json(&bundle_json)
        .unwrap_or_else(|e| fail(&format!("failed to parse bundle: {}", e)));

    let artifact = artifact_path.map(|path| {
        fs::read(path).unwrap_or_else(|e| fail(&format!("failed to read artifact: {}", e)))
    });

    let verifier = Verifier::new(&trust, VerifierOptions::default());
    match verifier.verify(&bundle, artifact.as_deref(), &policy) {
        Ok(signer) => {
            println!("Verified OK");
            match signer.identity {
                Some(identity) => {
                    if let Some(san) = identity.subject_alternative_name {
                        println!("  Identity: {}", san);
                    }
                    if let Some(issuer) = identity.extensions.issuer {
                        println!("  Issuer:   {}", issuer);
                    }
                }
                None => println!("  Signer:   {:?} public key", signer.key.key_type()),
            }
        }
        Err(e) => {
            eprintln!("Verification failed [{}]: {}", e.code(), e);
            process::exit(1);
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: verify_bundle [OPTIONS] <TRUSTED_ROOT> <BUNDLE> [ARTIFACT]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --identity <REGEX>  Required certificate SAN pattern");
    eprintln!("  -o, --issuer <URL>      Required OIDC issuer");
    eprintln!("  -h, --help              Show this help");
}
