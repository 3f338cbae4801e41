diesel::table! {
    payments (id) {
        id -> Uuid,
        user_id -> Uuid,
        game_id -> Uuid,
        amount -> Numeric,
        status -> Varchar,
        created_at_utc -> Timestamptz,
        updated_at_utc -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    event_store (id) {
        id -> Uuid,
        aggregate_id -> Uuid,
        #[sql_name = "type"]
        type_ -> Varchar,
        data -> Jsonb,
        created_at_utc -> Timestamptz,
    }
}

diesel::table! {
    outbox_events (id) {
        id -> Uuid,
        aggregate_id -> Uuid,
        event_type -> Varchar,
        event_data -> Jsonb,
        destination -> Varchar,
        processed -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(payments, event_store, outbox_events);
