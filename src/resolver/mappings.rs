//! Fixed header mapping tables used by the classifier.
//!
//! These tables hold everything the classifier cannot learn from the build
//! description itself: headers owned by third-party packages, generated
//! headers owned by internal proto libraries, and headers to ignore. The
//! built-in defaults can be extended or replaced from configuration.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Header -> external package.
const EXTERNAL_DEPS: &[(&str, &str)] = &[
    ("absl/base/attributes.h", "absl/base:core_headers"),
    ("absl/base/call_once.h", "absl/base"),
    ("absl/base/internal/endian.h", "absl-base"),
    ("absl/base/thread_annotations.h", "absl/base:core_headers"),
    ("absl/container/flat_hash_map.h", "absl/container:flat_hash_map"),
    ("absl/container/flat_hash_set.h", "absl/container:flat_hash_set"),
    ("absl/container/inlined_vector.h", "absl/container:inlined_vector"),
    ("absl/functional/bind_front.h", "absl/functional:bind_front"),
    ("absl/functional/function_ref.h", "absl/functional:function_ref"),
    ("absl/hash/hash.h", "absl/hash"),
    ("absl/memory/memory.h", "absl/memory"),
    ("absl/meta/type_traits.h", "absl/meta:type_traits"),
    ("absl/random/random.h", "absl/random"),
    ("absl/status/status.h", "absl/status"),
    ("absl/status/statusor.h", "absl/status:statusor"),
    ("absl/strings/ascii.h", "absl/strings"),
    ("absl/strings/cord.h", "absl/strings:cord"),
    ("absl/strings/escaping.h", "absl/strings"),
    ("absl/strings/match.h", "absl/strings"),
    ("absl/strings/numbers.h", "absl/strings"),
    ("absl/strings/str_cat.h", "absl/strings"),
    ("absl/strings/str_format.h", "absl/strings:str_format"),
    ("absl/strings/str_join.h", "absl/strings"),
    ("absl/strings/str_replace.h", "absl/strings"),
    ("absl/strings/str_split.h", "absl/strings"),
    ("absl/strings/string_view.h", "absl/strings"),
    ("absl/strings/strip.h", "absl/strings"),
    ("absl/strings/substitute.h", "absl/strings"),
    ("absl/synchronization/mutex.h", "absl/synchronization"),
    ("absl/synchronization/notification.h", "absl/synchronization"),
    ("absl/time/clock.h", "absl/time"),
    ("absl/time/time.h", "absl/time"),
    ("absl/types/optional.h", "absl/types:optional"),
    ("absl/types/span.h", "absl/types:span"),
    ("absl/types/variant.h", "absl/types:variant"),
    ("absl/utility/utility.h", "absl/utility"),
    ("address_sorting/address_sorting.h", "address_sorting"),
    ("ares.h", "cares"),
    ("gmock/gmock.h", "gtest"),
    ("gtest/gtest.h", "gtest"),
    ("opencensus/trace/context_util.h", "opencensus-trace-context_util"),
    ("opencensus/trace/propagation/grpc_trace_bin.h", "opencensus-trace-propagation"),
    ("opencensus/tags/context_util.h", "opencensus-tags-context_util"),
    ("openssl/bio.h", "libssl"),
    ("openssl/bn.h", "libcrypto"),
    ("openssl/buffer.h", "libcrypto"),
    ("openssl/crypto.h", "libcrypto"),
    ("openssl/engine.h", "libcrypto"),
    ("openssl/err.h", "libcrypto"),
    ("openssl/evp.h", "libcrypto"),
    ("openssl/hmac.h", "libcrypto"),
    ("openssl/pem.h", "libcrypto"),
    ("openssl/rsa.h", "libcrypto"),
    ("openssl/sha.h", "libcrypto"),
    ("openssl/ssl.h", "libssl"),
    ("openssl/tls1.h", "libssl"),
    ("openssl/x509.h", "libcrypto"),
    ("openssl/x509v3.h", "libcrypto"),
    ("re2/re2.h", "re2"),
    ("upb/def.h", "upb_lib"),
    ("upb/json_encode.h", "upb_json_lib"),
    ("upb/text_encode.h", "upb_textformat_lib"),
    ("upb/def.hpp", "upb_reflection"),
    ("upb/upb.h", "upb_lib"),
    ("upb/upb.hpp", "upb_lib"),
    ("xxhash.h", "xxhash"),
    ("zlib.h", "madler_zlib"),
];

/// Header -> internal package (mostly generated proto headers).
const INTERNAL_DEPS: &[(&str, &str)] = &[
    ("google/rpc/status.upb.h", "google_rpc_status_upb"),
    ("google/protobuf/any.upb.h", "protobuf_any_upb"),
    ("google/protobuf/duration.upb.h", "protobuf_duration_upb"),
    ("google/protobuf/struct.upb.h", "protobuf_struct_upb"),
    ("google/protobuf/timestamp.upb.h", "protobuf_timestamp_upb"),
    ("google/protobuf/wrappers.upb.h", "protobuf_wrappers_upb"),
    ("src/proto/grpc/channelz/channelz.grpc.pb.h", "//src/proto/grpc/channelz:channelz_proto"),
    ("src/proto/grpc/core/stats.pb.h", "//src/proto/grpc/core:stats_proto"),
    ("src/proto/grpc/health/v1/health.upb.h", "grpc_health_upb"),
    ("src/proto/grpc/lb/v1/load_reporter.grpc.pb.h", "//src/proto/grpc/lb/v1:load_reporter_proto"),
    ("src/proto/grpc/lb/v1/load_balancer.upb.h", "grpc_lb_upb"),
    (
        "src/proto/grpc/reflection/v1alpha/reflection.grpc.pb.h",
        "//src/proto/grpc/reflection/v1alpha:reflection_proto",
    ),
    ("src/proto/grpc/gcp/transport_security_common.upb.h", "alts_upb"),
    ("src/proto/grpc/gcp/altscontext.upb.h", "alts_upb"),
    ("src/proto/grpc/lookup/v1/rls.upb.h", "rls_upb"),
    ("src/proto/grpc/lookup/v1/rls_config.upb.h", "rls_config_upb"),
    ("src/proto/grpc/lookup/v1/rls_config.upbdefs.h", "rls_config_upbdefs"),
    ("src/proto/grpc/testing/xds/v3/csds.grpc.pb.h", "//src/proto/grpc/testing/xds/v3:csds_proto"),
    ("xds/data/orca/v3/orca_load_report.upb.h", "xds_orca_upb"),
    ("xds/service/orca/v3/orca.upb.h", "xds_orca_service_upb"),
    ("xds/type/v3/typed_struct.upb.h", "xds_type_upb"),
];

/// Headers ignored before any lookup happens.
const IGNORE: &[&str] = &["src/core/lib/profiling/stap_probes.h"];

/// Headers skipped after every other rule failed.
const SKIP: &[&str] = &["google/api/expr/v1alpha1/syntax.upb.h"];

/// Leading directories of OS headers.
const SYSTEM_DIRS: &[&str] = &[
    "sys",
    "arpa",
    "netinet",
    "linux",
    "android",
    "mach",
    "net",
    "CoreFoundation",
];

/// A family of external packages named after the first path segment under
/// a shared prefix: `opencensus/trace/x.h` -> `opencensus-trace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRule {
    /// Header path prefix, including the trailing `/`
    pub prefix: String,

    /// Prefix prepended to the derived package name
    pub package_prefix: String,
}

/// Headers under a path prefix that all resolve to one external package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixPackageRule {
    /// Header path prefix
    pub prefix: String,

    /// Headers ending with this suffix are not covered by the rule
    #[serde(default)]
    pub exclude_suffix: Option<String>,

    /// The external package
    pub package: String,
}

/// All data-driven inputs of the classification cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTables {
    /// Headers ignored unconditionally, checked first
    pub ignore: BTreeSet<String>,

    /// Header -> internal package
    pub internal: BTreeMap<String, String>,

    /// Header -> external package
    pub external: BTreeMap<String, String>,

    /// External package families keyed by path prefix
    pub namespaces: Vec<NamespaceRule>,

    /// Prefixes whose headers map to derived internal service packages
    pub service_prefixes: Vec<String>,

    /// Prefix rules mapping to a single external package
    pub prefix_packages: Vec<PrefixPackageRule>,

    /// Leading directories of system headers
    pub system_dirs: BTreeSet<String>,

    /// Headers skipped when nothing else matched
    pub skip: BTreeSet<String>,
}

impl MappingTables {
    /// Tables with no entries at all.
    pub fn empty() -> Self {
        MappingTables {
            ignore: BTreeSet::new(),
            internal: BTreeMap::new(),
            external: BTreeMap::new(),
            namespaces: Vec::new(),
            service_prefixes: Vec::new(),
            prefix_packages: Vec::new(),
            system_dirs: BTreeSet::new(),
            skip: BTreeSet::new(),
        }
    }

    /// Apply configuration on top of these tables.
    pub fn extend_with(&mut self, config: &MappingsConfig) {
        self.ignore.extend(config.ignore.iter().cloned());
        self.skip.extend(config.skip.iter().cloned());
        self.system_dirs.extend(config.system_dirs.iter().cloned());
        self.internal
            .extend(config.internal.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.external
            .extend(config.external.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.namespaces.extend(config.namespaces.iter().cloned());
        self.service_prefixes
            .extend(config.service_prefixes.iter().cloned());
        self.prefix_packages
            .extend(config.prefix_packages.iter().cloned());
    }

    /// Build tables from configuration, starting from the defaults unless
    /// the configuration asks to replace them.
    pub fn from_config(config: &MappingsConfig) -> Self {
        let mut tables = if config.replace_defaults {
            MappingTables::empty()
        } else {
            MappingTables::default()
        };
        tables.extend_with(config);
        tables
    }
}

impl Default for MappingTables {
    fn default() -> Self {
        let owned = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let set = |items: &[&str]| -> BTreeSet<String> {
            items.iter().map(|s| s.to_string()).collect()
        };

        MappingTables {
            ignore: set(IGNORE),
            internal: owned(INTERNAL_DEPS),
            external: owned(EXTERNAL_DEPS),
            namespaces: vec![NamespaceRule {
                prefix: "opencensus/".to_string(),
                package_prefix: "opencensus-".to_string(),
            }],
            service_prefixes: vec!["envoy/".to_string()],
            prefix_packages: vec![PrefixPackageRule {
                prefix: "google/protobuf/".to_string(),
                exclude_suffix: Some(".upb.h".to_string()),
                package: "protobuf_headers".to_string(),
            }],
            system_dirs: set(SYSTEM_DIRS),
            skip: set(SKIP),
        }
    }
}

/// `[mappings]` section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingsConfig {
    /// Start from empty tables instead of the built-in defaults
    pub replace_defaults: bool,

    /// Additional header -> internal package entries
    pub internal: BTreeMap<String, String>,

    /// Additional header -> external package entries
    pub external: BTreeMap<String, String>,

    /// Additional headers ignored before lookup
    pub ignore: Vec<String>,

    /// Additional headers skipped after all rules
    pub skip: Vec<String>,

    /// Additional system header directories
    pub system_dirs: Vec<String>,

    /// Additional external package families
    pub namespaces: Vec<NamespaceRule>,

    /// Additional internal service prefixes
    pub service_prefixes: Vec<String>,

    /// Additional single-package prefix rules
    pub prefix_packages: Vec<PrefixPackageRule>,
}

impl MappingsConfig {
    /// Merge another mappings section into this one (other takes precedence).
    pub fn merge(&mut self, other: MappingsConfig) {
        if other.replace_defaults {
            *self = MappingsConfig {
                replace_defaults: true,
                ..MappingsConfig::default()
            };
        }
        self.internal.extend(other.internal);
        self.external.extend(other.external);
        self.ignore.extend(other.ignore);
        self.skip.extend(other.skip);
        self.system_dirs.extend(other.system_dirs);
        self.namespaces.extend(other.namespaces);
        self.service_prefixes.extend(other.service_prefixes);
        self.prefix_packages.extend(other.prefix_packages);
    }
}
