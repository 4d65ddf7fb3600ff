use anyhow::anyhow;
use quarry_api::{
    PREFERENCE_RESOURCE_TYPE, PreferenceAttributes, PreferenceResource, SavedSearchEntryWire,
};
use quarry_domain::{
    ListViewId, OwnerId, PreferenceId, SavedSearchEntry, SavedSearchStore, SerializedTree,
    UserPreferenceRecord,
};

pub(crate) fn record_from_resource(
    resource: PreferenceResource,
) -> anyhow::Result<UserPreferenceRecord> {
    if resource.kind != PREFERENCE_RESOURCE_TYPE {
        return Err(anyhow!(
            "unexpected resource type {:?}, expected {PREFERENCE_RESOURCE_TYPE:?}",
            resource.kind
        ));
    }

    let PreferenceAttributes {
        owner_id,
        saved_searches,
        other,
    } = resource.attributes;

    let mut store = SavedSearchStore::new();
    for (list_view, searches) in saved_searches {
        let searches = searches
            .into_iter()
            .map(|(name, entry)| {
                (
                    name,
                    SavedSearchEntry {
                        is_default: entry.is_default,
                        query_tree: SerializedTree::new(entry.query_tree),
                    },
                )
            })
            .collect();
        store.0.insert(ListViewId::new(list_view), searches);
    }

    Ok(UserPreferenceRecord {
        id: resource.id.map(PreferenceId),
        owner_id: OwnerId::new(owner_id),
        saved_searches: store,
        other,
    })
}

pub(crate) fn resource_from_record(record: &UserPreferenceRecord) -> PreferenceResource {
    let saved_searches = record
        .saved_searches
        .0
        .iter()
        .map(|(list_view, searches)| {
            let searches = searches
                .iter()
                .map(|(name, entry)| {
                    (
                        name.clone(),
                        SavedSearchEntryWire {
                            is_default: entry.is_default,
                            query_tree: entry.query_tree.as_value().clone(),
                        },
                    )
                })
                .collect();
            (list_view.as_str().to_owned(), searches)
        })
        .collect();

    PreferenceResource::new(
        record.id.as_ref().map(|id| id.as_str().to_owned()),
        PreferenceAttributes {
            owner_id: record.owner_id.as_str().to_owned(),
            saved_searches,
            other: record.other.clone(),
        },
    )
}
