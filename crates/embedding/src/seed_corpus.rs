//! Seed corpus of short benign sentences the isolation forest is fit against
//! at construction, analogous to a bundled demo-asset fixture. "Data, not
//! code" — a plain const array, never regenerated per call.
pub const SEED_CORPUS: &[&str] = &[
    "the quarterly report shows steady growth across all regions",
    "please review the attached meeting notes before friday",
    "the recipe calls for two cups of flour and one egg",
    "our team completed the migration ahead of schedule",
    "the museum opens at nine and closes at five on weekdays",
    "customer satisfaction scores improved this quarter",
    "the weather forecast predicts light rain tomorrow afternoon",
    "the library added a new collection of historical maps",
    "training data should be diverse and representative",
    "the software update fixes several minor display bugs",
    "volunteers planted trees along the riverside trail",
    "the committee will vote on the proposal next week",
    "researchers published findings on renewable energy storage",
    "the orchestra performed a new symphony to a full hall",
    "shipping delays affected several regional distribution centers",
    "the city council approved funding for park renovations",
    "students submitted their final projects before the deadline",
    "the bakery introduced a seasonal menu for autumn",
    "engineers tested the prototype under various load conditions",
    "the documentary explores migration patterns of arctic birds",
    "investors reviewed the annual financial statements carefully",
    "the hiking trail offers scenic views of the valley below",
    "teachers attended a workshop on classroom technology",
    "the factory increased output while maintaining quality standards",
    "local farmers reported a strong harvest this season",
    "the conference featured speakers from several universities",
    "maintenance crews repaired the bridge over the weekend",
    "the novel follows three generations of a coastal family",
    "analysts expect moderate growth in the housing market",
    "the clinic extended its hours to accommodate more patients",
    "the choir rehearsed twice a week leading up to the concert",
    "the startup secured a new round of venture funding",
    "park rangers monitored wildlife activity throughout the summer",
    "the architecture firm unveiled plans for a new library wing",
    "the airline added two new routes to its winter schedule",
    "community gardens provided fresh produce to local shelters",
    "the university expanded its scholarship program this year",
    "technicians calibrated the equipment before the experiment began",
    "the magazine published a feature on sustainable architecture",
    "the town hosted its annual festival with record attendance",
];
