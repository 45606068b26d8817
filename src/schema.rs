diesel::table! {
    artists (id) {
        id -> Integer,
        name -> Text,
        city -> Text,
        state -> Text,
        phone -> Text,
        genres -> Text,
        image_link -> Nullable<Text>,
        facebook_link -> Nullable<Text>,
        website_link -> Nullable<Text>,
        seeking_venue -> Bool,
        seeking_description -> Nullable<Text>,
    }
}

diesel::table! {
    shows (id) {
        id -> Integer,
        venue_id -> Integer,
        artist_id -> Integer,
        start_time -> Timestamp,
    }
}

diesel::table! {
    venues (id) {
        id -> Integer,
        name -> Text,
        city -> Text,
        state -> Text,
        address -> Text,
        phone -> Text,
        genres -> Text,
        image_link -> Nullable<Text>,
        facebook_link -> Nullable<Text>,
        website_link -> Nullable<Text>,
        seeking_talent -> Bool,
        seeking_description -> Nullable<Text>,
    }
}

diesel::joinable!(shows -> artists (artist_id));
diesel::joinable!(shows -> venues (venue_id));

diesel::allow_tables_to_appear_in_same_query!(artists, shows, venues);
