use crate::models::ClusterRecord;

pub struct Notice {
    pub subject: String,
    pub body: String,
}

pub fn cluster_created(record: &ClusterRecord) -> Notice {
    Notice {
        subject: format!("EKS cluster {} created and available", record.name),
        body: format!(
            "Hello,\n\nYour EKS cluster {} (cluster ID {}) is available. It will be torn down \
             automatically {} minutes after creation unless its lifetime is prolonged.\n",
            record.name, record.id, record.timeout
        ),
    }
}

pub fn cluster_expiring(record: &ClusterRecord, window_minutes: i64) -> Notice {
    Notice {
        subject: format!(
            "EKS cluster {} shutting down in {} min",
            record.name, window_minutes
        ),
        body: format!(
            "Hello,\n\nYour EKS cluster {} (cluster ID {}) will shut down and all associated \
             resources will be destroyed within the next few minutes. Prolong it now if you \
             still need it.\n",
            record.name, record.id
        ),
    }
}
