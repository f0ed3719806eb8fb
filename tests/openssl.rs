mod util;

use std::fs;
use std::process::Command;
use std::sync::Arc;

use minica::{Certificate, CertificateParams, KeyPair};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509StoreContext};
use regex::Regex;

use util::{ec_key, generate_ca_cert, issue_ca, issue_leaf};

fn to_openssl(cert: &Certificate) -> X509 {
    X509::from_pem(cert.certificate_pem().unwrap().as_bytes()).expect("Failed to parse PEM")
}

fn openssl_verify(ca: &Certificate, cert: &Certificate, intermediates: &[Certificate]) -> bool {
    let mut builder = X509StoreBuilder::new().unwrap();
    builder.add_cert(to_openssl(ca)).unwrap();
    let store = builder.build();

    let mut chain = Stack::new().unwrap();
    for intermediate in intermediates {
        chain.push(to_openssl(intermediate)).unwrap();
    }

    let mut context = X509StoreContext::new().unwrap();
    context
        .init(&store, &to_openssl(cert), &chain, |c| c.verify_cert())
        .unwrap()
}

fn entry(name: &openssl::x509::X509NameRef, nid: Nid) -> String {
    name.entries_by_nid(nid)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_cli_reads_cert() {
    let ca = generate_ca_cert("myca.local");
    let server = ca
        .issue(
            CertificateParams::builder()
                .common_name("server.myca.local")
                .sans(vec!["IP:127.0.0.1".to_string()])
                .organization("Crab widgits SE")
                .private_key(ec_key())
                .build(),
        )
        .unwrap();

    let dir = std::env::temp_dir().join(format!("minica-openssl-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let cert_path = dir.join("server_cert.pem");
    fs::write(&cert_path, server.certificate_pem().unwrap())
        .expect("Failed to write server certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    fs::remove_dir_all(&dir).unwrap();

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_text = String::from_utf8_lossy(&output.stdout);

    // Newer OpenSSL releases put spaces around '='.
    let issuer = Regex::new(r"Issuer: ?CN ?= ?myca\.local").unwrap();
    let subject = Regex::new(r"Subject: ?CN ?= ?server\.myca\.local, ?O ?= ?Crab widgits SE").unwrap();
    assert!(issuer.is_match(&output_text), "Issuer field is incorrect");
    assert!(subject.is_match(&output_text), "Subject field is incorrect");
    assert!(output_text.contains("Version: 3 (0x2)"));
    assert!(output_text.contains("Serial Number: 1 (0x1)"));
    assert!(output_text.contains("X509v3 Basic Constraints: critical"));
    assert!(output_text.contains("CA:FALSE"));
    assert!(output_text.contains("IP Address:127.0.0.1, DNS:server.myca.local"));
    assert!(output_text.contains("Signature Algorithm: ecdsa-with-SHA256"));
    assert!(Regex::new(r"Not Before: .+").unwrap().is_match(&output_text));
    assert!(Regex::new(r"Not After : .+").unwrap().is_match(&output_text));
}

#[test]
fn test_openssl_crate_reads_cert() {
    let ca = generate_ca_cert("myca.local");
    let server = issue_leaf(&ca, "server.myca.local");
    let x509 = to_openssl(&server);

    assert_eq!(entry(x509.subject_name(), Nid::COMMONNAME), "server.myca.local");
    assert_eq!(entry(x509.issuer_name(), Nid::COMMONNAME), "myca.local");
    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), "1");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::ECDSA_WITH_SHA256
    );

    let ca_key = to_openssl(&ca).public_key().unwrap();
    assert!(x509.verify(&ca_key).unwrap());
}

#[test]
fn test_openssl_subject_fields() {
    let cert = Certificate::new(
        CertificateParams::builder()
            .common_name("www")
            .country("US")
            .state("Oregon")
            .location("Springfield")
            .organization("Example Corp")
            .private_key(ec_key())
            .build(),
    )
    .unwrap();
    let x509 = to_openssl(&cert);

    let subject = x509.subject_name();
    let nids: Vec<Nid> = subject.entries().map(|e| e.object().nid()).collect();
    assert_eq!(
        nids,
        vec![
            Nid::COMMONNAME,
            Nid::COUNTRYNAME,
            Nid::STATEORPROVINCENAME,
            Nid::LOCALITYNAME,
            Nid::ORGANIZATIONNAME
        ]
    );
    assert_eq!(entry(subject, Nid::COUNTRYNAME), "US");
    assert_eq!(entry(subject, Nid::ORGANIZATIONNAME), "Example Corp");
    assert_eq!(
        x509.subject_name().to_der().unwrap(),
        x509.issuer_name().to_der().unwrap()
    );
}

#[test]
fn test_openssl_verifies_chain() {
    let root = generate_ca_cert("root");
    let intermediate = issue_ca(&root, "intermediate");
    let leaf = issue_leaf(&intermediate, "leaf");
    let direct = issue_leaf(&root, "direct");
    let unrelated = generate_ca_cert("unrelated");

    assert!(openssl_verify(&root, &direct, &[]));
    assert!(openssl_verify(&root, &leaf, &leaf.chain()));
    assert!(!openssl_verify(&root, &leaf, &[]));
    assert!(!openssl_verify(&unrelated, &direct, &[]));
}

#[test]
fn test_openssl_verifies_rsa_chain() {
    let root = Certificate::new(
        CertificateParams::builder()
            .common_name("rsa root")
            .is_ca(true)
            .build(),
    )
    .unwrap();
    let leaf = root
        .issue(
            CertificateParams::builder()
                .common_name("ed25519 leaf")
                .private_key(Arc::new(KeyPair::generate_ed25519()))
                .build(),
        )
        .unwrap();

    assert_eq!(
        to_openssl(&leaf).signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );
    assert!(openssl_verify(&root, &leaf, &[]));
}

#[test]
fn test_openssl_private_key_matches_cert() {
    let root = generate_ca_cert("root");
    let ec_leaf = issue_leaf(&root, "ec");
    let rsa_leaf = root
        .issue(CertificateParams::builder().common_name("rsa").build())
        .unwrap();

    for cert in [&root, &ec_leaf, &rsa_leaf] {
        let key = PKey::private_key_from_pem(cert.private_key_pem().unwrap().as_bytes())
            .expect("OpenSSL failed to parse private key");
        let public_key = to_openssl(cert).public_key().unwrap();
        assert!(public_key.public_eq(&key));
    }
}
