//! Search path synthesis for AutoPath.
//!
//! AutoPath lets a server answer a short, unqualified name on the first
//! attempt by walking the client's search path itself. The search path of a
//! client is derived from the workload the client's address belongs to.

use std::net::IpAddr;

use domain::base::ToName;
use tracing::{debug, trace};

use crate::dispatcher::Dispatcher;
use crate::request::Request;
use crate::zones::fqdn;

impl Dispatcher {
    /// Returns the search path for a client at `source`.
    ///
    /// Returns `None` if `qname` is in none of the backends' zones or if
    /// any of the backends cannot find the client's workload.
    ///
    /// For each zone `z` of each backend the path contains
    /// `<namespace>.svc.<z>`, `svc.<z>` and `<z>`. Later backends come
    /// first. The system search list follows and an empty string ends the
    /// path.
    pub fn auto_path<N: ToName + ?Sized>(
        &self,
        qname: &N,
        source: IpAddr,
    ) -> Option<Vec<String>> {
        if !self
            .entries()
            .iter()
            .any(|entry| entry.zones().matches(qname).is_some())
        {
            return None;
        }

        let mut search_path: Vec<String> = Vec::new();
        for (index, entry) in self.entries().iter().enumerate() {
            let Some(workload) = entry.backend().pod_for_source_ip(source)
            else {
                trace!("Backend {index} has no workload for {source}");
                return None;
            };
            let namespace = workload.namespace();
            trace!(
                "Backend {index} maps {source} to {} in {namespace}",
                workload.ip()
            );

            for zone in entry.zones() {
                let search = if zone.is_root() {
                    [
                        format!("{namespace}.svc."),
                        String::from("svc."),
                        String::from("."),
                    ]
                } else {
                    let zone = fqdn(zone);
                    [
                        format!("{namespace}.svc.{zone}"),
                        format!("svc.{zone}"),
                        zone,
                    ]
                };
                search_path.splice(0..0, search);
            }
        }

        search_path.extend(self.search().iter().cloned());
        search_path.push(String::new());
        debug!(
            "AutoPath search path for {source} will be {:?}",
            search_path
        );
        Some(search_path)
    }

    /// Returns the search path for the client of `request`.
    pub fn auto_path_for(&self, request: &Request) -> Option<Vec<String>> {
        let question = request.question().ok()?;
        self.auto_path(&question.qname, request.source_ip())
    }
}
