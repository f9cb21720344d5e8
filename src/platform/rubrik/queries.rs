//! GraphQL documents used against the Rubrik API
//!
//! Trimmed to the fields this tool reads. Every listing selects `pageInfo`
//! so callers can follow cursors.

pub const FILESET_TEMPLATES: &str = r#"
query FilesetTemplateListQuery($hostRoot: HostRoot!, $first: Int!, $after: String, $filter: [Filter!]!) {
  filesetTemplates(hostRoot: $hostRoot, first: $first, after: $after, filter: $filter, sortBy: NAME, sortOrder: ASC) {
    edges {
      node {
        id
        name
        cluster { id name }
        physicalChildConnection {
          edges {
            node {
              id
              name
              effectiveSlaDomain { id name }
              physicalPath { fid name objectType }
            }
          }
        }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const VSPHERE_VMS: &str = r#"
query VSphereVmListQuery($first: Int!, $after: String, $filter: [Filter!]) {
  vSphereVmNewConnection(first: $first, after: $after, filter: $filter) {
    edges {
      node {
        id
        name
        cluster { id name }
        effectiveSlaDomain { id name }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const SLA_DOMAINS: &str = r#"
query SLAListQuery($first: Int, $after: String) {
  slaDomains(first: $first, after: $after) {
    edges {
      node {
        name
        ... on ClusterSlaDomain { id: fid }
        ... on GlobalSlaReply { id }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const SLA_PROTECTED_OBJECTS: &str = r#"
query ProtectedObjectListQuery($slaIds: [UUID!]!, $first: Int, $after: String) {
  slaProtectedObjects(slaIds: $slaIds, first: $first, after: $after) {
    edges {
      node {
        id
        name
        objectType
        cluster { id name }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const SNAPSHOTS_OF_OBJECT: &str = r#"
query SnapshotsListSingleQuery($snappableId: String!, $first: Int, $after: String) {
  snapshotsListConnection: snapshotOfASnappableConnection(
    workloadId: $snappableId
    first: $first
    after: $after
    sortBy: CREATION_TIME
    sortOrder: DESC
  ) {
    edges {
      node {
        id
        date
        isOnDemandSnapshot
        ... on CdmSnapshot { slaDomain { id name } }
        ... on PolarisSnapshot { slaDomain { id name } }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const CREATE_ON_DEMAND_SNAPSHOT: &str = r#"
mutation CreateOnDemandSnapshot($id: String!) {
  createOnDemandSnapshot(id: $id, config: {}) {
    id
    status
  }
}
"#;
