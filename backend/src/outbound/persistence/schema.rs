//! Diesel table definitions. Kept in step with `backend/migrations`.

diesel::table! {
    /// Accounts resolved from bearer credentials.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        full_name -> Varchar,
        /// `patient`, `doctor`, or `admin`.
        role -> Varchar,
        /// `free` or `premium`.
        membership_type -> Varchar,
        is_verified -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per admitted metered operation.
    ///
    /// `created_at` is the sole quota-period discriminator and is indexed
    /// together with `(user_id, kind)`.
    metered_operations (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// `diagnosis` or `drug_analysis`.
        kind -> Varchar,
        /// `pending` until the result is stored, then `completed`.
        status -> Varchar,
        request -> Jsonb,
        result -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(metered_operations -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(metered_operations, users);
