use crate::environment::get_env_var_as_vec;

/// How many search results to request per topic.
pub const RESULTS_PER_TOPIC: usize = 3;

/// Topics the batch importer searches on every run, in run order.
pub const AUTO_IMPORT_TOPICS: &[&str] = &[
    // Ancient sites
    "Gobekli Tepe new discoveries 2024",
    "Sphinx water erosion theory Schoch",
    "Great Pyramid mysteries secrets",
    "Puma Punku ancient technology Bolivia",
    "Baalbek megaliths Lebanon",
    "Easter Island moai mysteries",
    "Stonehenge new findings 2024",
    "Karahan Tepe Turkey excavation",
    "Angkor Wat hidden cities",
    "Nazca Lines new discoveries",
    "Machu Picchu mysteries",
    "Teotihuacan secrets",
    "Derinkuyu underground city",
    "Newgrange winter solstice",
    "Sacsayhuaman impossible walls",
    "Knossos Minoan civilization",
    // Researchers & podcasts
    "Graham Hancock Ancient Apocalypse",
    "Randall Carlson Younger Dryas",
    "Jimmy Corsetti Bright Insight",
    "UnchartedX ancient precision machining",
    "John Anthony West symbolist Egypt",
    "Robert Schoch climate catastrophe",
    "Brien Foerster elongated skulls",
    "Matthew LaCroix ancient wisdom",
    "Ben van Kerkwyk UnchartedX",
    // Theories
    "Younger Dryas impact hypothesis evidence",
    "Lost civilization before ice age",
    "Ancient astronaut theory evidence",
    "Atlantis location Richat Structure",
    "Pre-flood civilization evidence",
    "Global flood myths connections",
    "Megalithic builders unknown technology",
    "Anunnaki Sumerian texts",
    "Nephilim giants evidence",
    "Vimana ancient flying machines",
    // Topics
    "Ancient advanced technology evidence",
    "Prehistoric global civilization theory",
    "Ancient star maps astronomy",
    "Elongated skulls Paracas DNA",
    "Ancient underwater ruins Yonaguni",
    "Out of place artifacts ooparts",
    "Antikythera mechanism ancient computer",
    "Dendera light bulb Egypt",
    "Coral Castle mystery Florida",
    "Longyou Caves China mystery",
    "Bosnian Pyramids Visoko",
    "Gunung Padang Indonesia pyramid",
    "Gobekli Tepe astronomical alignments",
    "Ancient nuclear war evidence",
    "Mohenjo Daro ancient city",
];

/// The topic list for this run: the `TOPICS` environment variable (`;`
/// delimited) when set, otherwise the builtin table.
pub fn import_topics() -> Vec<String> {
    let from_env = get_env_var_as_vec("TOPICS", ';');
    if !from_env.is_empty() {
        return from_env;
    }
    AUTO_IMPORT_TOPICS.iter().map(|s| s.to_string()).collect()
}
