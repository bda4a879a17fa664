//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    baseline_style_guidelines (id) {
        id -> BigInt,
        category -> Text,
        product_type -> Nullable<Text>,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    legal_guidelines (id) {
        id -> BigInt,
        domain -> Text,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    published_style_guides (id) {
        id -> Uuid,
        seq -> BigInt,
        category -> Text,
        product_type -> Text,
        field_name -> Nullable<Text>,
        style_guide_md -> Text,
        needs_review -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(baseline_style_guidelines, legal_guidelines, published_style_guides,);
