//! Curated mailing lists offered by the reader.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub area: &'static str,
    pub active: bool,
}

const fn seed(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    area: &'static str,
) -> ListSeed {
    ListSeed {
        id,
        name,
        description,
        area,
        active: true,
    }
}

pub const CURATED_LISTS: &[ListSeed] = &[
    seed("tls", "TLS", "Transport Layer Security", "Security"),
    seed("ietf", "IETF", "General Discussion", "General"),
    seed("dnsop", "DNSOP", "DNS Operations", "Operations"),
    seed("httpapi", "HTTPAPI", "Building Blocks for HTTP APIs", "Applications"),
    seed("quic", "QUIC", "QUIC Protocol", "Transport"),
    seed("oauth", "OAUTH", "Web Authorization Protocol", "Security"),
    seed("rats", "RATS", "Remote ATtestation procedureS", "Security"),
    seed("pqc", "PQC", "Post-Quantum Cryptography", "Security"),
    seed("secdispatch", "SECDISPATCH", "Security Dispatch", "Security"),
    seed("openpgp", "OPENPGP", "Open PGP", "Security"),
    seed("add", "ADD", "Adaptive DNS Discovery", "Internet"),
    seed("dns-privacy", "DNS-PRIVACY", "DNS PRIVate Exchange", "Internet"),
    seed(
        "masque",
        "MASQUE",
        "Multiplexed App Substrate over QUIC Encryption",
        "Transport",
    ),
    seed("mls", "MLS", "Messaging Layer Security", "Security"),
    seed(
        "ohai",
        "OHAI",
        "Oblivious HTTP Application Intermediation",
        "Applications",
    ),
];
